//! Payment ledger.
//!
//! Append-only record of individual payment transactions against
//! appointments. An appointment's `paid_amount` is the sum of its completed
//! payments, cached on the appointment itself for fast reads; the two are
//! kept consistent by writing the ledger entry and the appointment mutation
//! in one sled transaction.
//!
//! The overpayment and already-paid checks re-read the appointment *inside*
//! the transaction, so two concurrent partial payments can never both pass
//! against a stale balance: sled serializes the closures touching these
//! trees, and exactly one of the racers observes the other's increment.

use crate::accounts::{Principal, Role};
use crate::appointments::{Appointment, PaymentStatus};
use crate::doctors::DoctorDirectory;
use crate::error::{ClinicError, ClinicResult};
use crate::patients::PatientDirectory;
use crate::store::{self, ClinicStore};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use std::sync::Arc;
use uuid::Uuid;

/// How a payment was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Upi,
    Wallet,
    NetBanking,
    Cash,
}

/// State of a ledger entry. Entries are immutable once `Completed`, except
/// for the (unexposed) `Completed → Refunded` transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// One ledger entry: a single payment transaction against an appointment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Gateway transaction reference; globally unique across the ledger.
    pub transaction_id: String,
    pub state: PaymentState,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub(crate) fn completed(
        appointment_id: Uuid,
        patient_id: Uuid,
        amount: Decimal,
        method: PaymentMethod,
        transaction_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            appointment_id,
            patient_id,
            amount,
            method,
            transaction_id,
            state: PaymentState::Completed,
            created_at: now,
        }
    }
}

/// Ledger service over the payments collection.
#[derive(Clone)]
pub struct PaymentLedger {
    store: Arc<ClinicStore>,
    patients: PatientDirectory,
    doctors: DoctorDirectory,
}

impl PaymentLedger {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self {
            patients: PatientDirectory::new(store.clone()),
            doctors: DoctorDirectory::new(store.clone()),
            store,
        }
    }

    /// Record a payment against an appointment.
    ///
    /// All preconditions are checked transactionally with the appointment
    /// update: the appointment exists and is not fully paid, the caller is
    /// the owning patient, the amount is positive and within the remaining
    /// balance, and the transaction id is unused. On success the completed
    /// ledger entry, the incremented `paid_amount` and the rederived
    /// payment/lifecycle status commit as one unit; on any failure nothing
    /// is written.
    pub fn record_payment(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
        amount: Decimal,
        method: PaymentMethod,
        transaction_id: &str,
    ) -> ClinicResult<(Payment, Appointment)> {
        if principal.role != Role::Patient {
            return Err(ClinicError::Forbidden);
        }
        if amount <= Decimal::ZERO {
            return Err(ClinicError::InvalidAmount);
        }
        let transaction_id = transaction_id.trim();
        if transaction_id.is_empty() {
            return Err(ClinicError::Validation("transaction id is required".into()));
        }

        let patient = self.patients.profile_for_user(principal.id)?;
        let now = Utc::now();
        let payment = Payment::completed(
            appointment_id,
            patient.id,
            amount,
            method,
            transaction_id.to_owned(),
            now,
        );
        let payment_doc = store::encode_doc(&payment)?;

        let appointment = (
            self.store.appointments(),
            self.store.payments(),
            self.store.payments_by_txn(),
        )
            .transaction(|(appointments, payments, by_txn)| {
                let bytes = appointments
                    .get(appointment_id.as_bytes())?
                    .ok_or(ConflictableTransactionError::Abort(ClinicError::NotFound(
                        "appointment",
                    )))?;
                let mut appointment: Appointment = store::decode_in_txn(&bytes)?;

                if appointment.patient_id != patient.id {
                    return Err(ConflictableTransactionError::Abort(
                        ClinicError::Unauthorized,
                    ));
                }
                if appointment.payment_status == PaymentStatus::Paid {
                    return Err(ConflictableTransactionError::Abort(ClinicError::AlreadyPaid));
                }
                if appointment.paid_amount + amount > appointment.consultation_fee {
                    return Err(ConflictableTransactionError::Abort(ClinicError::Overpayment));
                }
                if by_txn.get(transaction_id.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        ClinicError::DuplicateTransaction,
                    ));
                }

                appointment.apply_payment(amount, now);

                by_txn.insert(transaction_id.as_bytes(), payment.id.as_bytes())?;
                payments.insert(payment.id.as_bytes(), payment_doc.as_slice())?;
                appointments.insert(
                    appointment_id.as_bytes(),
                    store::encode_in_txn(&appointment)?,
                )?;
                Ok(appointment)
            })
            .map_err(ClinicError::from)?;

        tracing::info!(
            appointment = %appointment_id,
            amount = %amount,
            payment_status = ?appointment.payment_status,
            "payment recorded"
        );
        Ok((payment, appointment))
    }

    /// Ledger entries for an appointment, newest first.
    ///
    /// Visible to the owning patient, the owning doctor and admins.
    pub fn list_payments(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
    ) -> ClinicResult<Vec<Payment>> {
        let appointment: Appointment =
            store::get_doc(self.store.appointments(), appointment_id.as_bytes())?
                .ok_or(ClinicError::NotFound("appointment"))?;

        let allowed = match principal.role {
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
        if !allowed {
            return Err(ClinicError::Forbidden);
        }

        let mut payments: Vec<Payment> = store::scan_docs(self.store.payments())?;
        payments.retain(|p| p.appointment_id == appointment_id);
        // Tie-break on id so same-instant payments list in a stable order.
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(payments)
    }
}
