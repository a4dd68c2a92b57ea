//! Wire types for the REST API.
//!
//! Requests and responses are kept separate from the core domain structs so
//! the HTTP contract can evolve (and be documented via OpenAPI) without
//! leaking storage details. Conversions are mechanical.

use chrono::{DateTime, Utc};
use clinic_core::{
    Appointment, AppointmentPage, AppointmentStatus, Cancellation, DoctorDashboard, DoctorPage,
    DoctorProfile, DoctorStatus, EmergencyContact, Gender, Payment, PaymentMethod, PaymentState,
    PaymentStatus, Role, UserAccount,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Shared

/// Emergency contact details on a patient profile.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EmergencyContactDto {
    pub name: String,
    pub relation: String,
    pub phone: String,
}

impl From<EmergencyContact> for EmergencyContactDto {
    fn from(c: EmergencyContact) -> Self {
        Self {
            name: c.name,
            relation: c.relation,
            phone: c.phone,
        }
    }
}

impl From<EmergencyContactDto> for EmergencyContact {
    fn from(c: EmergencyContactDto) -> Self {
        Self {
            name: c.name,
            relation: c.relation,
            phone: c.phone,
        }
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

/// Pagination / search parameters for listing endpoints.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: Option<usize>,
    /// Page size, clamped server-side.
    pub limit: Option<usize>,
    /// Substring filter on specialization (doctor listing only).
    pub search: Option<String>,
}

// ---------------------------------------------------------------------------
// Auth

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterReq {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    /// `patient`, `doctor` or `admin`.
    #[schema(value_type = String)]
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountRes {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    #[schema(value_type = String)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<UserAccount> for AccountRes {
    fn from(a: UserAccount) -> Self {
        Self {
            id: a.id,
            username: a.username,
            email: a.email,
            phone: a.phone,
            role: a.role,
            created_at: a.created_at,
        }
    }
}

/// Token plus the account it belongs to, returned by register and login.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthRes {
    pub token: String,
    pub account: AccountRes,
}

// ---------------------------------------------------------------------------
// Doctors

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewDoctorReq {
    pub specialization: String,
    pub experience_years: u32,
    pub hospital_name: String,
    pub consultation_fee: Decimal,
}

/// Partial profile update; any change sends the profile back to `pending`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDoctorReq {
    pub specialization: Option<String>,
    pub experience_years: Option<u32>,
    pub hospital_name: Option<String>,
    pub consultation_fee: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorRes {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialization: String,
    pub experience_years: u32,
    pub hospital_name: String,
    pub consultation_fee: Decimal,
    #[schema(value_type = String)]
    pub status: DoctorStatus,
    pub is_active: bool,
    pub rating: f32,
    pub num_reviews: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DoctorProfile> for DoctorRes {
    fn from(d: DoctorProfile) -> Self {
        Self {
            id: d.id,
            user_id: d.user_id,
            specialization: d.specialization,
            experience_years: d.experience_years,
            hospital_name: d.hospital_name,
            consultation_fee: d.consultation_fee,
            status: d.status,
            is_active: d.is_active,
            rating: d.rating,
            num_reviews: d.num_reviews,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorPageRes {
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub doctors: Vec<DoctorRes>,
}

impl From<DoctorPage> for DoctorPageRes {
    fn from(p: DoctorPage) -> Self {
        Self {
            total: p.total,
            page: p.page,
            total_pages: p.total_pages,
            doctors: p.doctors.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardRes {
    pub total_appointments: usize,
    pub today_appointments: usize,
    pub confirmed_appointments: usize,
    pub completed_appointments: usize,
    pub cancelled_appointments: usize,
    pub total_revenue: Decimal,
}

impl From<DoctorDashboard> for DashboardRes {
    fn from(d: DoctorDashboard) -> Self {
        Self {
            total_appointments: d.total_appointments,
            today_appointments: d.today_appointments,
            confirmed_appointments: d.confirmed_appointments,
            completed_appointments: d.completed_appointments,
            cancelled_appointments: d.cancelled_appointments,
            total_revenue: d.total_revenue,
        }
    }
}

// ---------------------------------------------------------------------------
// Patients

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewPatientReq {
    pub name: String,
    pub age: u32,
    /// `male`, `female` or `other`.
    #[schema(value_type = String)]
    pub gender: Gender,
    pub blood_group: String,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medical_history: Vec<String>,
    pub emergency_contact: Option<EmergencyContactDto>,
}

/// Partial profile update; which fields a caller may touch depends on their
/// role.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePatientReq {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub blood_group: Option<String>,
    pub allergies: Option<Vec<String>>,
    pub medical_history: Option<Vec<String>>,
    pub emergency_contact: Option<EmergencyContactDto>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MedicalRecordReq {
    pub record: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PatientRes {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub age: u32,
    #[schema(value_type = String)]
    pub gender: Gender,
    pub blood_group: String,
    pub allergies: Vec<String>,
    pub medical_history: Vec<String>,
    pub emergency_contact: Option<EmergencyContactDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<clinic_core::PatientProfile> for PatientRes {
    fn from(p: clinic_core::PatientProfile) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            name: p.name,
            age: p.age,
            gender: p.gender,
            blood_group: p.blood_group,
            allergies: p.allergies,
            medical_history: p.medical_history,
            emergency_contact: p.emergency_contact.map(Into::into),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Appointments

/// Optional deposit to record alongside the booking.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositReq {
    pub amount: Decimal,
    /// `card`, `upi`, `wallet`, `net_banking` or `cash`.
    #[schema(value_type = String)]
    pub method: PaymentMethod,
    pub transaction_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookAppointmentReq {
    pub doctor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
    pub deposit: Option<DepositReq>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelReq {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    /// `confirmed`, `completed`, `cancelled` or `no-show`.
    #[schema(value_type = String)]
    pub status: AppointmentStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancellationRes {
    pub reason: Option<String>,
    #[schema(value_type = String)]
    pub cancelled_by: Role,
    pub cancelled_at: DateTime<Utc>,
}

impl From<Cancellation> for CancellationRes {
    fn from(c: Cancellation) -> Self {
        Self {
            reason: c.reason,
            cancelled_by: c.cancelled_by,
            cancelled_at: c.cancelled_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentRes {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub consultation_fee: Decimal,
    pub paid_amount: Decimal,
    #[schema(value_type = String)]
    pub payment_status: PaymentStatus,
    #[schema(value_type = String)]
    pub status: AppointmentStatus,
    pub cancellation: Option<CancellationRes>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentRes {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            doctor_id: a.doctor_id,
            patient_id: a.patient_id,
            scheduled_at: a.scheduled_at,
            duration_minutes: a.duration_minutes,
            consultation_fee: a.consultation_fee,
            paid_amount: a.paid_amount,
            payment_status: a.payment_status,
            status: a.status,
            cancellation: a.cancellation.map(Into::into),
            notes: a.notes,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentPageRes {
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub appointments: Vec<AppointmentRes>,
}

impl From<AppointmentPage> for AppointmentPageRes {
    fn from(p: AppointmentPage) -> Self {
        Self {
            total: p.total,
            page: p.page,
            total_pages: p.total_pages,
            appointments: p.appointments.into_iter().map(Into::into).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Payments

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentReq {
    pub amount: Decimal,
    /// `card`, `upi`, `wallet`, `net_banking` or `cash`.
    #[schema(value_type = String)]
    pub method: PaymentMethod,
    pub transaction_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentRes {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub amount: Decimal,
    #[schema(value_type = String)]
    pub method: PaymentMethod,
    pub transaction_id: String,
    #[schema(value_type = String)]
    pub state: PaymentState,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentRes {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            appointment_id: p.appointment_id,
            patient_id: p.patient_id,
            amount: p.amount,
            method: p.method,
            transaction_id: p.transaction_id,
            state: p.state,
            created_at: p.created_at,
        }
    }
}

/// Result of recording a payment: the ledger entry plus the appointment's
/// new balance and statuses.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentRecordedRes {
    pub payment: PaymentRes,
    pub appointment: AppointmentRes,
}
