//! # Clinic Core
//!
//! Core business logic for the clinic appointment-booking platform.
//!
//! This crate contains the domain model and persistence:
//! - Accounts, roles and the authenticated [`Principal`]
//! - Doctor and patient directories with their authorization rules
//! - The appointment state machine with derived payment status
//! - The payment ledger with transactional financial invariants
//! - The booking service that ties slot reservation, appointment creation
//!   and deposits into one atomic unit
//!
//! **No API concerns**: HTTP servers, tokens and wire formats belong in
//! `api-rest` and `api-shared`. Services are constructed from an explicit
//! [`ClinicStore`] handle and [`CoreConfig`]; there is no global connection.

pub mod accounts;
pub mod appointments;
pub mod booking;
pub mod config;
pub mod doctors;
pub mod error;
pub mod ledger;
pub mod patients;
pub mod store;

pub use accounts::{AccountService, NewAccount, Principal, Role, UserAccount};
pub use appointments::{
    derive_payment_status, normalize_to_minute, Appointment, AppointmentStatus, Cancellation,
    PaymentStatus,
};
pub use booking::{
    AppointmentPage, BookingRequest, BookingService, DepositRequest, DoctorDashboard,
};
pub use config::CoreConfig;
pub use doctors::{
    DoctorDirectory, DoctorPage, DoctorProfile, DoctorProfileUpdate, DoctorStatus,
    NewDoctorProfile,
};
pub use error::{ClinicError, ClinicResult};
pub use ledger::{Payment, PaymentLedger, PaymentMethod, PaymentState};
pub use patients::{
    allowed_fields, EmergencyContact, Gender, NewPatientProfile, PatientDirectory, PatientField,
    PatientProfile, PatientProfileUpdate,
};
pub use store::ClinicStore;
