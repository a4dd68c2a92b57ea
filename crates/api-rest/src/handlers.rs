//! HTTP request handlers.
//!
//! Handlers stay thin: decode the request, call the core service, convert the
//! result to a wire type. Role and ownership checks live in core; the only
//! HTTP-level concern here is bearer-token extraction via [`Auth`].

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use api_shared::{issue_token, HealthRes, HealthService};
use clinic_core::{
    BookingRequest, ClinicError, DepositRequest, DoctorProfileUpdate, NewAccount, NewDoctorProfile,
    NewPatientProfile, PatientProfileUpdate,
};

use crate::dto::*;
use crate::error::ApiError;
use crate::extract::Auth;
use crate::AppState;

const DEFAULT_PAGE: usize = 1;
const DEFAULT_LIMIT: usize = 10;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

// ---------------------------------------------------------------------------
// Auth

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created", body = AuthRes),
        (status = 400, description = "Invalid input", body = ErrorRes),
        (status = 409, description = "Email already registered", body = ErrorRes)
    )
)]
/// Register a new account
///
/// Creates the account and returns a signed access token alongside it, so
/// clients need no separate login after registration. Doctor and patient
/// accounts still need their profile created before they can take part in
/// booking.
///
/// # Errors
/// * `400` - username/email/password validation failed
/// * `409` - the email is already registered
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterReq>,
) -> Result<(StatusCode, Json<AuthRes>), ApiError> {
    let account = state.accounts.register(NewAccount {
        username: req.username,
        email: req.email,
        password: req.password,
        phone: req.phone,
        role: req.role,
    })?;
    let token = sign_token(&state, &account)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthRes {
            token,
            account: account.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in", body = AuthRes),
        (status = 401, description = "Wrong password", body = ErrorRes),
        (status = 404, description = "Unknown email", body = ErrorRes)
    )
)]
/// Log in with email and password
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<AuthRes>, ApiError> {
    let account = state.accounts.login(&req.email, &req.password)?;
    let token = sign_token(&state, &account)?;
    Ok(Json(AuthRes {
        token,
        account: account.into(),
    }))
}

fn sign_token(state: &AppState, account: &clinic_core::UserAccount) -> Result<String, ApiError> {
    issue_token(state.token_secret.as_bytes(), account.id, account.role).map_err(|e| {
        tracing::error!("token signing failed: {e}");
        ApiError(ClinicError::Validation("could not issue token".into()))
    })
}

// ---------------------------------------------------------------------------
// Doctors

#[utoipa::path(
    post,
    path = "/doctors",
    request_body = NewDoctorReq,
    responses(
        (status = 201, description = "Profile created, pending approval", body = DoctorRes),
        (status = 403, description = "Caller is not a doctor account", body = ErrorRes),
        (status = 409, description = "Profile already exists", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Create the calling doctor's profile
///
/// The profile starts in `pending` status; an admin must approve it before
/// the doctor appears in the public listing.
#[axum::debug_handler]
pub async fn create_doctor_profile(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<NewDoctorReq>,
) -> Result<(StatusCode, Json<DoctorRes>), ApiError> {
    let profile = state.doctors.create_profile(
        &principal,
        NewDoctorProfile {
            specialization: req.specialization,
            experience_years: req.experience_years,
            hospital_name: req.hospital_name,
            consultation_fee: req.consultation_fee,
        },
    )?;
    Ok((StatusCode::CREATED, Json(profile.into())))
}

#[utoipa::path(
    get,
    path = "/doctors/me",
    responses(
        (status = 200, description = "The calling doctor's profile", body = DoctorRes),
        (status = 404, description = "No profile yet", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// The calling doctor's own profile
#[axum::debug_handler]
pub async fn my_doctor_profile(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> Result<Json<DoctorRes>, ApiError> {
    let profile = state.doctors.my_profile(&principal)?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    put,
    path = "/doctors/me",
    request_body = UpdateDoctorReq,
    responses(
        (status = 200, description = "Updated profile, back in pending", body = DoctorRes),
        (status = 400, description = "Invalid input", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Update the calling doctor's profile
///
/// Any change resets the approval status to `pending`.
#[axum::debug_handler]
pub async fn update_doctor_profile(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<UpdateDoctorReq>,
) -> Result<Json<DoctorRes>, ApiError> {
    let profile = state.doctors.update_my_profile(
        &principal,
        DoctorProfileUpdate {
            specialization: req.specialization,
            experience_years: req.experience_years,
            hospital_name: req.hospital_name,
            consultation_fee: req.consultation_fee,
        },
    )?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    get,
    path = "/doctors",
    params(ListQuery),
    responses(
        (status = 200, description = "Approved doctors, paginated", body = DoctorPageRes)
    )
)]
/// Public listing of approved doctors
///
/// Supports pagination and substring search on specialization.
#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<DoctorPageRes>, ApiError> {
    let page = state.doctors.list_approved(
        q.page.unwrap_or(DEFAULT_PAGE),
        q.limit.unwrap_or(DEFAULT_LIMIT),
        q.search.as_deref(),
    )?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/doctors/pending",
    responses(
        (status = 200, description = "Profiles awaiting approval", body = [DoctorRes]),
        (status = 403, description = "Admin only", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Admin: profiles awaiting approval
#[axum::debug_handler]
pub async fn pending_doctors(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> Result<Json<Vec<DoctorRes>>, ApiError> {
    let pending = state.doctors.pending(&principal)?;
    Ok(Json(pending.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/doctors/dashboard",
    responses(
        (status = 200, description = "Aggregates for the calling doctor", body = DashboardRes),
        (status = 403, description = "Doctor only", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Appointment and revenue aggregates for the calling doctor
#[axum::debug_handler]
pub async fn doctor_dashboard(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> Result<Json<DashboardRes>, ApiError> {
    let dashboard = state.booking.dashboard(&principal)?;
    Ok(Json(dashboard.into()))
}

#[utoipa::path(
    get,
    path = "/doctors/{id}",
    params(("id" = Uuid, Path, description = "Doctor profile id")),
    responses(
        (status = 200, description = "An approved doctor", body = DoctorRes),
        (status = 404, description = "Unknown or not approved", body = ErrorRes)
    )
)]
/// A single approved doctor, by id
#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<DoctorRes>, ApiError> {
    let profile = state.doctors.get_approved(id)?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    put,
    path = "/doctors/{id}/approve",
    params(("id" = Uuid, Path, description = "Doctor profile id")),
    responses(
        (status = 200, description = "Doctor approved", body = DoctorRes),
        (status = 403, description = "Admin only", body = ErrorRes),
        (status = 404, description = "Unknown doctor", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Admin: approve a doctor
#[axum::debug_handler]
pub async fn approve_doctor(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<DoctorRes>, ApiError> {
    let profile = state.doctors.approve(&principal, id)?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    put,
    path = "/doctors/{id}/suspend",
    params(("id" = Uuid, Path, description = "Doctor profile id")),
    responses(
        (status = 200, description = "Doctor suspended", body = DoctorRes),
        (status = 403, description = "Admin only", body = ErrorRes),
        (status = 404, description = "Unknown doctor", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Admin: suspend a doctor
///
/// Suspended doctors disappear from the public listing and cannot be booked;
/// existing appointments are untouched.
#[axum::debug_handler]
pub async fn suspend_doctor(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<DoctorRes>, ApiError> {
    let profile = state.doctors.suspend(&principal, id)?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    delete,
    path = "/doctors/{id}",
    params(("id" = Uuid, Path, description = "Doctor profile id")),
    responses(
        (status = 200, description = "Doctor deactivated", body = DoctorRes),
        (status = 403, description = "Admin only", body = ErrorRes),
        (status = 404, description = "Unknown doctor", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Admin: deactivate a doctor
///
/// A soft delete; the profile stays on record but is no longer bookable.
#[axum::debug_handler]
pub async fn deactivate_doctor(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<DoctorRes>, ApiError> {
    let profile = state.doctors.deactivate(&principal, id)?;
    Ok(Json(profile.into()))
}

// ---------------------------------------------------------------------------
// Patients

#[utoipa::path(
    post,
    path = "/patients",
    request_body = NewPatientReq,
    responses(
        (status = 201, description = "Profile created", body = PatientRes),
        (status = 400, description = "Invalid input", body = ErrorRes),
        (status = 403, description = "Caller is not a patient account", body = ErrorRes),
        (status = 409, description = "Profile already exists", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Create the calling patient's profile
#[axum::debug_handler]
pub async fn create_patient_profile(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<NewPatientReq>,
) -> Result<(StatusCode, Json<PatientRes>), ApiError> {
    let profile = state.patients.create_profile(
        &principal,
        NewPatientProfile {
            name: req.name,
            age: req.age,
            gender: req.gender,
            blood_group: req.blood_group,
            allergies: req.allergies,
            medical_history: req.medical_history,
            emergency_contact: req.emergency_contact.map(Into::into),
        },
    )?;
    Ok((StatusCode::CREATED, Json(profile.into())))
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "All patient profiles", body = [PatientRes]),
        (status = 403, description = "Admin only", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Admin: list all patient profiles
#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> Result<Json<Vec<PatientRes>>, ApiError> {
    let patients = state.patients.list(&principal)?;
    Ok(Json(patients.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/patients/me",
    responses(
        (status = 200, description = "The calling patient's profile", body = PatientRes),
        (status = 404, description = "No profile yet", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// The calling patient's own profile
#[axum::debug_handler]
pub async fn my_patient_profile(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> Result<Json<PatientRes>, ApiError> {
    let profile = state.patients.my_profile(&principal)?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    put,
    path = "/patients/me",
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Updated profile", body = PatientRes),
        (status = 403, description = "Field outside the caller's capability set", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Update the calling patient's own profile
///
/// Which fields may be touched depends on the caller's role; a request
/// naming any field outside that set is refused whole.
#[axum::debug_handler]
pub async fn update_my_patient_profile(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<UpdatePatientReq>,
) -> Result<Json<PatientRes>, ApiError> {
    let profile = state
        .patients
        .update(&principal, None, patient_update(req))?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient profile id")),
    responses(
        (status = 200, description = "A patient profile", body = PatientRes),
        (status = 403, description = "Not visible to the caller", body = ErrorRes),
        (status = 404, description = "Unknown patient", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// A single patient profile, by id
///
/// Admins and doctors see any profile; a patient only their own.
#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<PatientRes>, ApiError> {
    let profile = state.patients.get(&principal, id)?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient profile id")),
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Updated profile", body = PatientRes),
        (status = 403, description = "Field outside the caller's capability set", body = ErrorRes),
        (status = 404, description = "Unknown patient", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Doctor/admin: update a patient profile by id
#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<UpdatePatientReq>,
) -> Result<Json<PatientRes>, ApiError> {
    let profile = state
        .patients
        .update(&principal, Some(id), patient_update(req))?;
    Ok(Json(profile.into()))
}

fn patient_update(req: UpdatePatientReq) -> PatientProfileUpdate {
    PatientProfileUpdate {
        name: req.name,
        age: req.age,
        blood_group: req.blood_group,
        allergies: req.allergies,
        medical_history: req.medical_history,
        emergency_contact: req.emergency_contact.map(Into::into),
    }
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient profile id")),
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 403, description = "Not the owner or an admin", body = ErrorRes),
        (status = 404, description = "Unknown patient", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Delete a patient profile
#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.patients.delete(&principal, id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/patients/{id}/medical-records",
    params(("id" = Uuid, Path, description = "Patient profile id")),
    request_body = MedicalRecordReq,
    responses(
        (status = 200, description = "Record appended", body = PatientRes),
        (status = 403, description = "Not the owner or an admin", body = ErrorRes),
        (status = 404, description = "Unknown patient", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Append an entry to a patient's medical history
#[axum::debug_handler]
pub async fn add_medical_record(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<MedicalRecordReq>,
) -> Result<Json<PatientRes>, ApiError> {
    let profile = state
        .patients
        .add_medical_record(&principal, id, req.record)?;
    Ok(Json(profile.into()))
}

// ---------------------------------------------------------------------------
// Appointments

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = BookAppointmentReq,
    responses(
        (status = 201, description = "Appointment booked", body = AppointmentRes),
        (status = 400, description = "Past schedule or bad deposit", body = ErrorRes),
        (status = 404, description = "Unknown or unapproved doctor", body = ErrorRes),
        (status = 409, description = "Slot already taken", body = ErrorRes),
        (status = 422, description = "Deposit exceeds the fee", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Book an appointment
///
/// The schedule is normalised to whole minutes; one appointment per doctor
/// per minute. An optional deposit is recorded atomically with the booking —
/// a deposit covering the full fee confirms the appointment immediately.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<BookAppointmentReq>,
) -> Result<(StatusCode, Json<AppointmentRes>), ApiError> {
    let appointment = state.booking.book(
        &principal,
        BookingRequest {
            doctor_id: req.doctor_id,
            scheduled_at: req.scheduled_at,
            duration_minutes: req.duration_minutes,
            notes: req.notes,
            deposit: req.deposit.map(|d| DepositRequest {
                amount: d.amount,
                method: d.method,
                transaction_id: d.transaction_id,
            }),
        },
    )?;
    Ok((StatusCode::CREATED, Json(appointment.into())))
}

#[utoipa::path(
    get,
    path = "/appointments/mine",
    params(ListQuery),
    responses(
        (status = 200, description = "The calling patient's appointments", body = AppointmentPageRes),
        (status = 403, description = "Patient only", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// The calling patient's appointments, soonest first
#[axum::debug_handler]
pub async fn my_appointments(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Query(q): Query<ListQuery>,
) -> Result<Json<AppointmentPageRes>, ApiError> {
    let page = state.booking.list_for_patient(
        &principal,
        q.page.unwrap_or(DEFAULT_PAGE),
        q.limit.unwrap_or(DEFAULT_LIMIT),
    )?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/appointments/doctor",
    params(ListQuery),
    responses(
        (status = 200, description = "The calling doctor's appointments", body = AppointmentPageRes),
        (status = 403, description = "Doctor only", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// The calling doctor's appointments, soonest first
#[axum::debug_handler]
pub async fn doctor_appointments(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Query(q): Query<ListQuery>,
) -> Result<Json<AppointmentPageRes>, ApiError> {
    let page = state.booking.list_for_doctor(
        &principal,
        q.page.unwrap_or(DEFAULT_PAGE),
        q.limit.unwrap_or(DEFAULT_LIMIT),
    )?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    patch,
    path = "/appointments/{id}/cancel",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = CancelReq,
    responses(
        (status = 200, description = "Appointment cancelled", body = AppointmentRes),
        (status = 403, description = "Not a party to the appointment", body = ErrorRes),
        (status = 404, description = "Unknown appointment", body = ErrorRes),
        (status = 422, description = "Already in a terminal state", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Cancel an appointment
///
/// Allowed from `pending` or `confirmed` by the owning patient, the owning
/// doctor or an admin. Records who cancelled and why.
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<CancelReq>,
) -> Result<Json<AppointmentRes>, ApiError> {
    let appointment = state.booking.cancel(&principal, id, req.reason)?;
    Ok(Json(appointment.into()))
}

#[utoipa::path(
    patch,
    path = "/appointments/{id}/status",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Status updated", body = AppointmentRes),
        (status = 400, description = "Pending is not a settable target", body = ErrorRes),
        (status = 403, description = "Not the owning doctor", body = ErrorRes),
        (status = 404, description = "Unknown appointment", body = ErrorRes),
        (status = 422, description = "Transition not allowed from the current state", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Doctor: move an appointment through its lifecycle
#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<UpdateStatusReq>,
) -> Result<Json<AppointmentRes>, ApiError> {
    let appointment = state
        .booking
        .set_status(&principal, id, req.status, req.reason)?;
    Ok(Json(appointment.into()))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/payments",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = PaymentReq,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentRecordedRes),
        (status = 400, description = "Non-positive amount or blank transaction id", body = ErrorRes),
        (status = 401, description = "Not the owning patient", body = ErrorRes),
        (status = 404, description = "Unknown appointment", body = ErrorRes),
        (status = 409, description = "Transaction id already used", body = ErrorRes),
        (status = 422, description = "Overpayment or already settled", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Record a payment against an appointment
///
/// Payments accumulate; covering the full fee flips the payment status to
/// `paid` and confirms a pending appointment.
#[axum::debug_handler]
pub async fn record_payment(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<PaymentReq>,
) -> Result<(StatusCode, Json<PaymentRecordedRes>), ApiError> {
    let (payment, appointment) =
        state
            .ledger
            .record_payment(&principal, id, req.amount, req.method, &req.transaction_id)?;
    Ok((
        StatusCode::CREATED,
        Json(PaymentRecordedRes {
            payment: payment.into(),
            appointment: appointment.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}/payments",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Ledger entries, newest first", body = [PaymentRes]),
        (status = 403, description = "Not a party to the appointment", body = ErrorRes),
        (status = 404, description = "Unknown appointment", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Ledger entries for an appointment, newest first
#[axum::debug_handler]
pub async fn list_payments(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<Vec<PaymentRes>>, ApiError> {
    let payments = state.ledger.list_payments(&principal, id)?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}
