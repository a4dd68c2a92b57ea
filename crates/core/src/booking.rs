//! Booking service: slot reservation, appointment creation and lifecycle
//! operations.
//!
//! Booking orchestrates the future-schedule check, the consultation-fee
//! snapshot, the slot reservation and the appointment insert — plus an
//! optional initial deposit — as one sled transaction. Either a fully formed
//! appointment (with or without its deposit ledger entry) exists afterwards,
//! or nothing does.
//!
//! Double-booking prevention is the slot tree: one entry per
//! `(doctor, minute)` pair, checked and inserted inside the same serialized
//! transaction that creates the appointment, so two concurrent requests for
//! one slot have exactly one winner.

use crate::accounts::{Principal, Role};
use crate::appointments::{
    derive_payment_status, normalize_to_minute, slot_key, Appointment, AppointmentStatus,
    PaymentStatus,
};
use crate::config::CoreConfig;
use crate::doctors::DoctorDirectory;
use crate::error::{ClinicError, ClinicResult};
use crate::ledger::{Payment, PaymentMethod};
use crate::patients::PatientDirectory;
use crate::store::{self, ClinicStore};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use std::sync::Arc;
use uuid::Uuid;

/// Optional deposit supplied at booking time, recorded through the ledger as
/// part of the booking transaction.
#[derive(Clone, Debug)]
pub struct DepositRequest {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub transaction_id: String,
}

/// Input for [`BookingService::book`].
#[derive(Clone, Debug)]
pub struct BookingRequest {
    pub doctor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
    pub deposit: Option<DepositRequest>,
}

/// One page of an appointment listing, sorted by `scheduled_at` ascending.
#[derive(Clone, Debug, Serialize)]
pub struct AppointmentPage {
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub appointments: Vec<Appointment>,
}

/// Aggregates for the doctor dashboard.
#[derive(Clone, Debug, Serialize)]
pub struct DoctorDashboard {
    pub total_appointments: usize,
    pub today_appointments: usize,
    pub confirmed_appointments: usize,
    pub completed_appointments: usize,
    pub cancelled_appointments: usize,
    /// Sum of `paid_amount` over fully paid appointments.
    pub total_revenue: Decimal,
}

/// Booking and lifecycle operations over the appointments collection.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<ClinicStore>,
    cfg: Arc<CoreConfig>,
    doctors: DoctorDirectory,
    patients: PatientDirectory,
}

impl BookingService {
    pub fn new(store: Arc<ClinicStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            doctors: DoctorDirectory::new(store.clone()),
            patients: PatientDirectory::new(store.clone()),
            store,
            cfg,
        }
    }

    /// Book an appointment for the calling patient.
    ///
    /// The schedule is normalised to whole minutes and must lie in the
    /// future. The doctor must be approved and active; their current
    /// consultation fee is snapshotted onto the appointment and never
    /// re-read. A deposit covering the full fee starts the appointment
    /// `confirmed`/`paid`; a smaller one starts it `pending`/`partial`.
    ///
    /// # Errors
    ///
    /// `PastSchedule`, `NotFound` (patient profile or doctor),
    /// `SlotConflict`, `InvalidAmount`/`Overpayment` for a bad deposit,
    /// `DuplicateTransaction` for a reused deposit transaction id.
    pub fn book(&self, principal: &Principal, req: BookingRequest) -> ClinicResult<Appointment> {
        if principal.role != Role::Patient {
            return Err(ClinicError::Forbidden);
        }
        let patient = self.patients.profile_for_user(principal.id)?;

        let now = Utc::now();
        let scheduled_at = normalize_to_minute(req.scheduled_at);
        if scheduled_at <= now {
            return Err(ClinicError::PastSchedule);
        }

        let doctor = self.doctors.get_approved(req.doctor_id)?;
        let fee = doctor.consultation_fee;

        let deposit_amount = match &req.deposit {
            Some(deposit) => {
                if deposit.amount <= Decimal::ZERO {
                    return Err(ClinicError::InvalidAmount);
                }
                if deposit.amount > fee {
                    return Err(ClinicError::Overpayment);
                }
                if deposit.transaction_id.trim().is_empty() {
                    return Err(ClinicError::Validation("transaction id is required".into()));
                }
                deposit.amount
            }
            None => Decimal::ZERO,
        };

        let payment_status = derive_payment_status(deposit_amount, fee);
        let status = if payment_status == PaymentStatus::Paid {
            AppointmentStatus::Confirmed
        } else {
            AppointmentStatus::Pending
        };

        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: doctor.id,
            patient_id: patient.id,
            scheduled_at,
            duration_minutes: req
                .duration_minutes
                .unwrap_or_else(|| self.cfg.default_duration_minutes()),
            consultation_fee: fee,
            paid_amount: deposit_amount,
            payment_status,
            status,
            cancellation: None,
            notes: req.notes,
            created_at: now,
            updated_at: now,
        };
        if appointment.duration_minutes == 0 {
            return Err(ClinicError::Validation(
                "appointment duration must be positive".into(),
            ));
        }

        let deposit_payment = req.deposit.as_ref().map(|deposit| {
            Payment::completed(
                appointment.id,
                patient.id,
                deposit.amount,
                deposit.method,
                deposit.transaction_id.trim().to_owned(),
                now,
            )
        });

        let appointment_doc = store::encode_doc(&appointment)?;
        let payment_doc = deposit_payment
            .as_ref()
            .map(store::encode_doc)
            .transpose()?;
        let key = slot_key(&appointment.doctor_id, appointment.scheduled_at);

        (
            self.store.appointments(),
            self.store.slots(),
            self.store.payments(),
            self.store.payments_by_txn(),
        )
            .transaction(|(appointments, slots, payments, by_txn)| {
                if slots.get(&key[..])?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        ClinicError::SlotConflict,
                    ));
                }
                slots.insert(&key[..], appointment.id.as_bytes())?;

                if let (Some(payment), Some(doc)) = (&deposit_payment, &payment_doc) {
                    if by_txn.get(payment.transaction_id.as_bytes())?.is_some() {
                        return Err(ConflictableTransactionError::Abort(
                            ClinicError::DuplicateTransaction,
                        ));
                    }
                    by_txn.insert(payment.transaction_id.as_bytes(), payment.id.as_bytes())?;
                    payments.insert(payment.id.as_bytes(), doc.as_slice())?;
                }

                appointments.insert(appointment.id.as_bytes(), appointment_doc.as_slice())?;
                Ok(())
            })
            .map_err(ClinicError::from)?;

        tracing::info!(
            appointment = %appointment.id,
            doctor = %appointment.doctor_id,
            scheduled_at = %appointment.scheduled_at,
            status = %appointment.status,
            "appointment booked"
        );
        Ok(appointment)
    }

    /// The calling patient's appointments, soonest first.
    pub fn list_for_patient(
        &self,
        principal: &Principal,
        page: usize,
        limit: usize,
    ) -> ClinicResult<AppointmentPage> {
        if principal.role != Role::Patient {
            return Err(ClinicError::Forbidden);
        }
        let patient = self.patients.profile_for_user(principal.id)?;
        self.page_of(|a| a.patient_id == patient.id, page, limit)
    }

    /// The calling doctor's appointments, soonest first.
    pub fn list_for_doctor(
        &self,
        principal: &Principal,
        page: usize,
        limit: usize,
    ) -> ClinicResult<AppointmentPage> {
        if principal.role != Role::Doctor {
            return Err(ClinicError::Forbidden);
        }
        let doctor = self.doctors.profile_for_user(principal.id)?;
        self.page_of(|a| a.doctor_id == doctor.id, page, limit)
    }

    /// Cancel an appointment.
    ///
    /// Allowed from `pending` or `confirmed` by the owning patient, the
    /// owning doctor or an admin. Records who cancelled and why.
    pub fn cancel(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
        reason: Option<String>,
    ) -> ClinicResult<Appointment> {
        let mut appointment = self.get(appointment_id)?;

        let owns = match principal.role {
            Role::Admin => true,
            Role::Patient => {
                let patient = self.patients.profile_for_user(principal.id)?;
                appointment.patient_id == patient.id
            }
            Role::Doctor => {
                let doctor = self.doctors.profile_for_user(principal.id)?;
                appointment.doctor_id == doctor.id
            }
        };
        if !owns {
            return Err(ClinicError::Forbidden);
        }

        appointment.transition(
            AppointmentStatus::Cancelled,
            principal.role,
            reason,
            Utc::now(),
        )?;
        self.persist(&appointment)?;

        tracing::info!(appointment = %appointment.id, by = %principal.role, "appointment cancelled");
        Ok(appointment)
    }

    /// Doctor: move their own appointment to `target`.
    ///
    /// Targets are limited to confirmed/completed/cancelled/no-show; the
    /// transition must also be legal from the current state.
    pub fn set_status(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
        target: AppointmentStatus,
        reason: Option<String>,
    ) -> ClinicResult<Appointment> {
        if principal.role != Role::Doctor {
            return Err(ClinicError::Forbidden);
        }
        if target == AppointmentStatus::Pending {
            return Err(ClinicError::InvalidStatus(target.to_string()));
        }

        let doctor = self.doctors.profile_for_user(principal.id)?;
        let mut appointment = self.get(appointment_id)?;
        if appointment.doctor_id != doctor.id {
            return Err(ClinicError::Forbidden);
        }

        appointment.transition(target, Role::Doctor, reason, Utc::now())?;
        self.persist(&appointment)?;

        tracing::info!(appointment = %appointment.id, status = %target, "appointment status updated");
        Ok(appointment)
    }

    /// Aggregates for the calling doctor's dashboard.
    pub fn dashboard(&self, principal: &Principal) -> ClinicResult<DoctorDashboard> {
        if principal.role != Role::Doctor {
            return Err(ClinicError::Forbidden);
        }
        let doctor = self.doctors.profile_for_user(principal.id)?;

        let mut appointments: Vec<Appointment> = store::scan_docs(self.store.appointments())?;
        appointments.retain(|a| a.doctor_id == doctor.id);

        let today = Utc::now().date_naive();
        Ok(DoctorDashboard {
            total_appointments: appointments.len(),
            today_appointments: appointments
                .iter()
                .filter(|a| a.scheduled_at.date_naive() == today)
                .count(),
            confirmed_appointments: appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::Confirmed)
                .count(),
            completed_appointments: appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::Completed)
                .count(),
            cancelled_appointments: appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::Cancelled)
                .count(),
            total_revenue: appointments
                .iter()
                .filter(|a| a.payment_status == PaymentStatus::Paid)
                .map(|a| a.paid_amount)
                .sum(),
        })
    }

    /// Fetch an appointment by id.
    pub fn get(&self, id: Uuid) -> ClinicResult<Appointment> {
        store::get_doc(self.store.appointments(), id.as_bytes())?
            .ok_or(ClinicError::NotFound("appointment"))
    }

    fn persist(&self, appointment: &Appointment) -> ClinicResult<()> {
        store::put_doc(self.store.appointments(), appointment.id.as_bytes(), appointment)
    }

    fn page_of(
        &self,
        filter: impl Fn(&Appointment) -> bool,
        page: usize,
        limit: usize,
    ) -> ClinicResult<AppointmentPage> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let mut appointments: Vec<Appointment> = store::scan_docs(self.store.appointments())?;
        appointments.retain(|a| filter(a));
        appointments.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));

        let total = appointments.len();
        let total_pages = total.div_ceil(limit);
        let appointments = appointments
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();

        Ok(AppointmentPage {
            total,
            page,
            total_pages,
            appointments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Fixture;
    use rust_decimal_macros::dec;

    fn request(doctor_id: Uuid, scheduled_at: DateTime<Utc>) -> BookingRequest {
        BookingRequest {
            doctor_id,
            scheduled_at,
            duration_minutes: None,
            notes: None,
            deposit: None,
        }
    }

    #[test]
    fn book_snapshots_fee_and_applies_defaults() {
        let fx = Fixture::with_fee(dec!(1000));
        let appointment = fx
            .booking
            .book(&fx.patient, request(fx.doctor_profile.id, Fixture::slot_in(60)))
            .expect("book");

        assert_eq!(appointment.patient_id, fx.patient_profile.id);
        assert_eq!(appointment.doctor_id, fx.doctor_profile.id);
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.payment_status, PaymentStatus::Pending);
        assert_eq!(appointment.consultation_fee, dec!(1000));
        assert_eq!(appointment.paid_amount, Decimal::ZERO);
        assert_eq!(appointment.duration_minutes, 30);

        // A later fee change must not alter the existing appointment.
        fx.doctors
            .update_my_profile(
                &fx.doctor,
                crate::doctors::DoctorProfileUpdate {
                    consultation_fee: Some(dec!(2500)),
                    ..Default::default()
                },
            )
            .expect("raise fee");
        let reread = fx.booking.get(appointment.id).expect("reread");
        assert_eq!(reread.consultation_fee, dec!(1000));
    }

    #[test]
    fn same_slot_collides_even_with_sub_minute_differences() {
        let fx = Fixture::with_fee(dec!(500));
        let slot = Fixture::slot_in(120);
        fx.booking
            .book(&fx.patient, request(fx.doctor_profile.id, slot))
            .expect("first booking");

        let other = fx.other_patient();
        let err = fx
            .booking
            .book(
                &other,
                request(fx.doctor_profile.id, slot + chrono::Duration::seconds(42)),
            )
            .expect_err("same minute must conflict");
        assert!(matches!(err, ClinicError::SlotConflict));

        // The adjacent minute is free.
        fx.booking
            .book(&other, request(fx.doctor_profile.id, slot + chrono::Duration::minutes(1)))
            .expect("next minute books fine");
    }

    #[test]
    fn concurrent_bookings_have_exactly_one_winner() {
        let fx = Fixture::with_fee(dec!(500));
        let slot = Fixture::slot_in(60);
        let other = fx.other_patient();

        let handles: Vec<_> = [fx.patient, other]
            .into_iter()
            .map(|principal| {
                let booking = fx.booking.clone();
                let doctor_id = fx.doctor_profile.id;
                std::thread::spawn(move || booking.book(&principal, request(doctor_id, slot)))
            })
            .collect();

        let outcomes: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread join"))
            .collect();

        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "exactly one booking must win the slot");
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(ClinicError::SlotConflict))));
    }

    #[test]
    fn past_schedule_creates_no_record_at_all() {
        let fx = Fixture::with_fee(dec!(500));
        let mut req = request(fx.doctor_profile.id, Utc::now() - chrono::Duration::hours(1));
        req.deposit = Some(DepositRequest {
            amount: dec!(500),
            method: PaymentMethod::Card,
            transaction_id: "txn-past".into(),
        });

        let err = fx.booking.book(&fx.patient, req).expect_err("past schedule");
        assert!(matches!(err, ClinicError::PastSchedule));

        assert_eq!(fx.store.appointments().len(), 0);
        assert_eq!(fx.store.slots().len(), 0);
        assert_eq!(fx.store.payments().len(), 0);
    }

    #[test]
    fn full_deposit_confirms_partial_deposit_does_not() {
        let fx = Fixture::with_fee(dec!(1000));

        let mut req = request(fx.doctor_profile.id, Fixture::slot_in(60));
        req.deposit = Some(DepositRequest {
            amount: dec!(1000),
            method: PaymentMethod::Upi,
            transaction_id: "txn-full".into(),
        });
        let appointment = fx.booking.book(&fx.patient, req).expect("book with full deposit");
        assert_eq!(appointment.status, AppointmentStatus::Confirmed);
        assert_eq!(appointment.payment_status, PaymentStatus::Paid);

        let mut req = request(fx.doctor_profile.id, Fixture::slot_in(120));
        req.deposit = Some(DepositRequest {
            amount: dec!(250),
            method: PaymentMethod::Cash,
            transaction_id: "txn-part".into(),
        });
        let appointment = fx.booking.book(&fx.patient, req).expect("book with partial deposit");
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.payment_status, PaymentStatus::Partial);
        assert_eq!(appointment.paid_amount, dec!(250));
        assert_eq!(fx.store.payments().len(), 2);
    }

    #[test]
    fn deposit_above_fee_is_rejected() {
        let fx = Fixture::with_fee(dec!(1000));
        let mut req = request(fx.doctor_profile.id, Fixture::slot_in(60));
        req.deposit = Some(DepositRequest {
            amount: dec!(1200),
            method: PaymentMethod::Card,
            transaction_id: "txn-over".into(),
        });
        let err = fx.booking.book(&fx.patient, req).expect_err("overpay deposit");
        assert!(matches!(err, ClinicError::Overpayment));
        assert_eq!(fx.store.appointments().len(), 0);
    }

    #[test]
    fn unapproved_doctor_cannot_be_booked() {
        let fx = Fixture::with_fee(dec!(500));
        fx.doctors
            .suspend(&fx.admin, fx.doctor_profile.id)
            .expect("suspend");
        let err = fx
            .booking
            .book(&fx.patient, request(fx.doctor_profile.id, Fixture::slot_in(60)))
            .expect_err("suspended doctor");
        assert!(matches!(err, ClinicError::NotFound(_)));
    }

    #[test]
    fn cancel_ownership_and_terminal_rules() {
        let fx = Fixture::with_fee(dec!(500));
        let appointment = fx
            .booking
            .book(&fx.patient, request(fx.doctor_profile.id, Fixture::slot_in(60)))
            .expect("book");

        let stranger = fx.other_patient();
        assert!(matches!(
            fx.booking.cancel(&stranger, appointment.id, None),
            Err(ClinicError::Forbidden)
        ));

        let cancelled = fx
            .booking
            .cancel(&fx.patient, appointment.id, Some("can't make it".into()))
            .expect("patient cancels own");
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        let audit = cancelled.cancellation.expect("audit entry");
        assert_eq!(audit.cancelled_by, Role::Patient);

        let err = fx
            .booking
            .cancel(&fx.admin, appointment.id, None)
            .expect_err("already cancelled");
        assert!(matches!(err, ClinicError::InvalidTransition { .. }));
    }

    #[test]
    fn set_status_is_doctor_owned_and_rule_checked() {
        let fx = Fixture::with_fee(dec!(500));
        let appointment = fx
            .booking
            .book(&fx.patient, request(fx.doctor_profile.id, Fixture::slot_in(60)))
            .expect("book");

        // Pending -> Completed skips Confirmed and must fail.
        let err = fx
            .booking
            .set_status(&fx.doctor, appointment.id, AppointmentStatus::Completed, None)
            .expect_err("pending cannot complete");
        assert!(matches!(err, ClinicError::InvalidTransition { .. }));

        // Pending is not a settable target.
        let err = fx
            .booking
            .set_status(&fx.doctor, appointment.id, AppointmentStatus::Pending, None)
            .expect_err("pending target");
        assert!(matches!(err, ClinicError::InvalidStatus(_)));

        fx.booking
            .set_status(&fx.doctor, appointment.id, AppointmentStatus::Confirmed, None)
            .expect("confirm");
        let done = fx
            .booking
            .set_status(&fx.doctor, appointment.id, AppointmentStatus::Completed, None)
            .expect("complete");
        assert_eq!(done.status, AppointmentStatus::Completed);

        // Another doctor never touches this appointment.
        let other_doctor = Principal {
            id: Uuid::new_v4(),
            role: Role::Doctor,
        };
        fx.doctors
            .create_profile(
                &other_doctor,
                crate::doctors::NewDoctorProfile {
                    specialization: "dermatology".into(),
                    experience_years: 3,
                    hospital_name: "City Clinic".into(),
                    consultation_fee: dec!(300),
                },
            )
            .expect("other doctor profile");
        let err = fx
            .booking
            .set_status(&other_doctor, appointment.id, AppointmentStatus::Cancelled, None)
            .expect_err("not the owning doctor");
        assert!(matches!(err, ClinicError::Forbidden));
    }

    #[test]
    fn listings_sort_by_schedule_ascending() {
        let fx = Fixture::with_fee(dec!(500));
        for minutes in [180, 60, 120] {
            fx.booking
                .book(&fx.patient, request(fx.doctor_profile.id, Fixture::slot_in(minutes)))
                .expect("book");
        }

        let page = fx
            .booking
            .list_for_patient(&fx.patient, 1, 10)
            .expect("list");
        assert_eq!(page.total, 3);
        let times: Vec<_> = page.appointments.iter().map(|a| a.scheduled_at).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted, "soonest first");

        let page = fx.booking.list_for_doctor(&fx.doctor, 2, 2).expect("page 2");
        assert_eq!(page.appointments.len(), 1);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn dashboard_counts_and_revenue() {
        let fx = Fixture::with_fee(dec!(1000));
        let mut req = request(fx.doctor_profile.id, Fixture::slot_in(60));
        req.deposit = Some(DepositRequest {
            amount: dec!(1000),
            method: PaymentMethod::Card,
            transaction_id: "txn-dash".into(),
        });
        fx.booking.book(&fx.patient, req).expect("paid booking");
        fx.booking
            .book(&fx.patient, request(fx.doctor_profile.id, Fixture::slot_in(120)))
            .expect("unpaid booking");

        let dashboard = fx.booking.dashboard(&fx.doctor).expect("dashboard");
        assert_eq!(dashboard.total_appointments, 2);
        assert_eq!(dashboard.confirmed_appointments, 1);
        assert_eq!(dashboard.total_revenue, dec!(1000));
    }
}
