//! Appointment model and its state machine.
//!
//! An appointment carries two related but distinct pieces of state:
//!
//! - `status` — the lifecycle state (`pending → confirmed → completed`, with
//!   cancellation and no-show branches). Terminal states admit no further
//!   transitions.
//! - `payment_status` — **derived**, never set by a caller. It is always the
//!   pure function [`derive_payment_status`] of `(paid_amount,
//!   consultation_fee)`, recomputed on every paid-amount change. Reaching full
//!   payment auto-advances a pending appointment to confirmed.
//!
//! The consultation fee is snapshotted from the doctor's profile at booking
//! time; later fee changes never alter existing appointments.
//!
//! The conflict key for double-booking is `(doctor_id, scheduled_at)` with
//! `scheduled_at` truncated to whole minutes, so two requests differing only
//! in sub-minute precision collide.

use crate::accounts::Role;
use crate::error::{ClinicError, ClinicResult};
use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an appointment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::Cancelled
                | AppointmentStatus::NoShow
        )
    }

    /// Whether moving from `self` to `to` is a legal lifecycle transition.
    pub fn can_transition(self, to: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        match self {
            Pending => matches!(to, Confirmed | Cancelled),
            Confirmed => matches!(to, Completed | Cancelled | NoShow),
            Completed | Cancelled | NoShow => false,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = ClinicError;

    fn from_str(s: &str) -> ClinicResult<Self> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no-show" => Ok(AppointmentStatus::NoShow),
            other => Err(ClinicError::InvalidStatus(other.to_owned())),
        }
    }
}

/// Derived payment state of an appointment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
    Refunded,
}

/// Audit record attached when an appointment is cancelled.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cancellation {
    pub reason: Option<String>,
    pub cancelled_by: Role,
    pub cancelled_at: DateTime<Utc>,
}

/// A booked consultation slot between a patient and a doctor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    /// Exact start instant, normalised to whole minutes. Canonical conflict key
    /// together with `doctor_id`.
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    /// Fee snapshot taken from the doctor's profile at booking time.
    pub consultation_fee: Decimal,
    /// Sum of completed ledger payments; monotonically non-decreasing and
    /// never above `consultation_fee`.
    pub paid_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub status: AppointmentStatus,
    pub cancellation: Option<Cancellation>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pure derivation of the payment state from amounts.
///
/// `Refunded` is never derived here; it would be set by an explicit refund
/// operation, which this system does not expose.
pub fn derive_payment_status(paid_amount: Decimal, consultation_fee: Decimal) -> PaymentStatus {
    if paid_amount <= Decimal::ZERO {
        PaymentStatus::Pending
    } else if paid_amount < consultation_fee {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Paid
    }
}

/// Truncate a timestamp to whole minutes (seconds and sub-seconds zeroed).
pub fn normalize_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Key of the slot-uniqueness tree: doctor UUID bytes followed by the
/// minute-normalised start instant as big-endian epoch seconds.
pub(crate) fn slot_key(doctor_id: &Uuid, scheduled_at: DateTime<Utc>) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..16].copy_from_slice(doctor_id.as_bytes());
    key[16..].copy_from_slice(
        &normalize_to_minute(scheduled_at)
            .timestamp()
            .to_be_bytes(),
    );
    key
}

impl Appointment {
    /// Apply a completed payment of `amount` and rederive the payment state.
    ///
    /// Full payment confirms a pending booking; partial payment does not.
    /// The caller is responsible for validating the amount against the
    /// remaining balance before applying it.
    pub fn apply_payment(&mut self, amount: Decimal, now: DateTime<Utc>) {
        self.paid_amount += amount;
        self.payment_status = derive_payment_status(self.paid_amount, self.consultation_fee);
        if self.payment_status == PaymentStatus::Paid && self.status == AppointmentStatus::Pending {
            self.status = AppointmentStatus::Confirmed;
        }
        self.updated_at = now;
    }

    /// Move the lifecycle state to `to`, enforcing the transition table.
    ///
    /// A transition to `Cancelled` records who cancelled and why.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if `to` is not reachable from the current state.
    pub fn transition(
        &mut self,
        to: AppointmentStatus,
        actor: Role,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> ClinicResult<()> {
        if !self.status.can_transition(to) {
            return Err(ClinicError::InvalidTransition {
                from: self.status,
                to,
            });
        }

        if to == AppointmentStatus::Cancelled {
            self.cancellation = Some(Cancellation {
                reason,
                cancelled_by: actor,
                cancelled_at: now,
            });
        }

        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample(fee: Decimal) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            scheduled_at: normalize_to_minute(now),
            duration_minutes: 30,
            consultation_fee: fee,
            paid_amount: Decimal::ZERO,
            payment_status: PaymentStatus::Pending,
            status: AppointmentStatus::Pending,
            cancellation: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn payment_status_is_a_pure_function_of_amounts() {
        let fee = dec!(1000);
        assert_eq!(derive_payment_status(dec!(0), fee), PaymentStatus::Pending);
        assert_eq!(derive_payment_status(dec!(0.01), fee), PaymentStatus::Partial);
        assert_eq!(derive_payment_status(dec!(999.99), fee), PaymentStatus::Partial);
        assert_eq!(derive_payment_status(dec!(1000), fee), PaymentStatus::Paid);
        assert_eq!(derive_payment_status(dec!(1200), fee), PaymentStatus::Paid);
    }

    #[test]
    fn partial_then_full_payment_confirms_pending_booking() {
        let mut appt = sample(dec!(1000));
        let now = Utc::now();

        appt.apply_payment(dec!(400), now);
        assert_eq!(appt.payment_status, PaymentStatus::Partial);
        assert_eq!(appt.status, AppointmentStatus::Pending, "partial payment must not confirm");

        appt.apply_payment(dec!(600), now);
        assert_eq!(appt.payment_status, PaymentStatus::Paid);
        assert_eq!(appt.status, AppointmentStatus::Confirmed);
        assert_eq!(appt.paid_amount, dec!(1000));
    }

    #[test]
    fn full_payment_does_not_touch_confirmed_or_terminal_status() {
        let mut appt = sample(dec!(500));
        appt.status = AppointmentStatus::Confirmed;
        appt.apply_payment(dec!(500), Utc::now());
        assert_eq!(appt.status, AppointmentStatus::Confirmed);
        assert_eq!(appt.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition(Confirmed));
        assert!(Pending.can_transition(Cancelled));
        assert!(!Pending.can_transition(Completed));
        assert!(!Pending.can_transition(NoShow));
        assert!(Confirmed.can_transition(Completed));
        assert!(Confirmed.can_transition(NoShow));
        assert!(Confirmed.can_transition(Cancelled));
        for terminal in [Completed, Cancelled, NoShow] {
            assert!(terminal.is_terminal());
            for to in [Pending, Confirmed, Completed, Cancelled, NoShow] {
                assert!(!terminal.can_transition(to));
            }
        }
    }

    #[test]
    fn cancelling_records_the_audit_entry() {
        let mut appt = sample(dec!(100));
        let now = Utc::now();
        appt.transition(
            AppointmentStatus::Cancelled,
            Role::Doctor,
            Some("patient request".into()),
            now,
        )
        .expect("cancel from pending");

        let cancellation = appt.cancellation.as_ref().expect("cancellation recorded");
        assert_eq!(cancellation.cancelled_by, Role::Doctor);
        assert_eq!(cancellation.reason.as_deref(), Some("patient request"));
    }

    #[test]
    fn cancelling_a_completed_appointment_fails() {
        let mut appt = sample(dec!(100));
        appt.status = AppointmentStatus::Completed;
        let err = appt
            .transition(AppointmentStatus::Cancelled, Role::Admin, None, Utc::now())
            .expect_err("terminal state");
        assert!(matches!(err, ClinicError::InvalidTransition { .. }));
    }

    #[test]
    fn slot_key_collapses_sub_minute_precision() {
        let doctor = Uuid::new_v4();
        let a = Utc.with_ymd_and_hms(2026, 9, 1, 10, 30, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 9, 1, 10, 30, 59).unwrap();
        let c = Utc.with_ymd_and_hms(2026, 9, 1, 10, 31, 0).unwrap();

        assert_eq!(slot_key(&doctor, a), slot_key(&doctor, b));
        assert_ne!(slot_key(&doctor, a), slot_key(&doctor, c));
        assert_ne!(slot_key(&doctor, a), slot_key(&Uuid::new_v4(), a));
    }
}
