//! Error taxonomy for clinic core operations.
//!
//! Every fallible core operation returns [`ClinicResult`]. Variants map one to
//! one onto the caller-facing failure classes: malformed input, ownership and
//! role violations, missing entities, state-machine rule violations, and the
//! financial invariants of the payment ledger. Storage and codec failures are
//! wrapped so the API layer can report them as internal errors.

use crate::appointments::AppointmentStatus;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0} already exists")]
    AlreadyExists(&'static str),
    #[error("doctor already booked at this time")]
    SlotConflict,
    #[error("appointment must be scheduled in the future")]
    PastSchedule,
    #[error("payment amount must be positive")]
    InvalidAmount,
    #[error("payment exceeds the remaining balance")]
    Overpayment,
    #[error("appointment is already fully paid")]
    AlreadyPaid,
    #[error("a payment with this transaction id already exists")]
    DuplicateTransaction,
    #[error("invalid appointment status: {0}")]
    InvalidStatus(String),
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("not allowed for this account")]
    Forbidden,
    #[error("authentication failed")]
    Unauthorized,
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("failed to encode stored document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to decode stored document: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to hash password: {0}")]
    PasswordHash(bcrypt::BcryptError),
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;

/// Unwrap a sled transaction outcome back into a `ClinicError`.
///
/// Domain failures inside a transaction closure abort via
/// `ConflictableTransactionError::Abort`; everything else is a storage fault.
impl From<sled::transaction::TransactionError<ClinicError>> for ClinicError {
    fn from(err: sled::transaction::TransactionError<ClinicError>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(e) => e,
            sled::transaction::TransactionError::Storage(e) => ClinicError::Storage(e),
        }
    }
}
