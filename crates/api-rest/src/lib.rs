//! # API REST
//!
//! REST API implementation for the clinic platform.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, bearer tokens)
//!
//! Uses `api-shared` for the health service and token utilities; all domain
//! logic lives in `clinic-core`.

#![warn(rust_2018_idioms)]

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;

use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use clinic_core::{
    AccountService, BookingService, ClinicStore, CoreConfig, DoctorDirectory, PatientDirectory,
    PaymentLedger,
};

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers:
/// the core services and the token-signing secret.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub doctors: DoctorDirectory,
    pub patients: PatientDirectory,
    pub booking: BookingService,
    pub ledger: PaymentLedger,
    pub token_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<ClinicStore>, cfg: Arc<CoreConfig>, token_secret: &str) -> Self {
        Self {
            accounts: AccountService::new(store.clone()),
            doctors: DoctorDirectory::new(store.clone()),
            patients: PatientDirectory::new(store.clone()),
            booking: BookingService::new(store.clone(), cfg),
            ledger: PaymentLedger::new(store),
            token_secret: token_secret.into(),
        }
    }
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::register,
        handlers::login,
        handlers::create_doctor_profile,
        handlers::my_doctor_profile,
        handlers::update_doctor_profile,
        handlers::list_doctors,
        handlers::pending_doctors,
        handlers::doctor_dashboard,
        handlers::get_doctor,
        handlers::approve_doctor,
        handlers::suspend_doctor,
        handlers::deactivate_doctor,
        handlers::create_patient_profile,
        handlers::list_patients,
        handlers::my_patient_profile,
        handlers::update_my_patient_profile,
        handlers::get_patient,
        handlers::update_patient,
        handlers::delete_patient,
        handlers::add_medical_record,
        handlers::book_appointment,
        handlers::my_appointments,
        handlers::doctor_appointments,
        handlers::cancel_appointment,
        handlers::update_appointment_status,
        handlers::record_payment,
        handlers::list_payments,
    ),
    components(schemas(
        api_shared::HealthRes,
        dto::ErrorRes,
        dto::RegisterReq,
        dto::LoginReq,
        dto::AccountRes,
        dto::AuthRes,
        dto::EmergencyContactDto,
        dto::NewDoctorReq,
        dto::UpdateDoctorReq,
        dto::DoctorRes,
        dto::DoctorPageRes,
        dto::DashboardRes,
        dto::NewPatientReq,
        dto::UpdatePatientReq,
        dto::MedicalRecordReq,
        dto::PatientRes,
        dto::DepositReq,
        dto::BookAppointmentReq,
        dto::CancelReq,
        dto::UpdateStatusReq,
        dto::CancellationRes,
        dto::AppointmentRes,
        dto::AppointmentPageRes,
        dto::PaymentReq,
        dto::PaymentRes,
        dto::PaymentRecordedRes,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Build the application router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/doctors", post(handlers::create_doctor_profile))
        .route("/doctors", get(handlers::list_doctors))
        .route("/doctors/me", get(handlers::my_doctor_profile))
        .route("/doctors/me", put(handlers::update_doctor_profile))
        .route("/doctors/pending", get(handlers::pending_doctors))
        .route("/doctors/dashboard", get(handlers::doctor_dashboard))
        .route("/doctors/:id", get(handlers::get_doctor))
        .route("/doctors/:id", delete(handlers::deactivate_doctor))
        .route("/doctors/:id/approve", put(handlers::approve_doctor))
        .route("/doctors/:id/suspend", put(handlers::suspend_doctor))
        .route("/patients", post(handlers::create_patient_profile))
        .route("/patients", get(handlers::list_patients))
        .route("/patients/me", get(handlers::my_patient_profile))
        .route("/patients/me", put(handlers::update_my_patient_profile))
        .route("/patients/:id", get(handlers::get_patient))
        .route("/patients/:id", put(handlers::update_patient))
        .route("/patients/:id", delete(handlers::delete_patient))
        .route(
            "/patients/:id/medical-records",
            post(handlers::add_medical_record),
        )
        .route("/appointments", post(handlers::book_appointment))
        .route("/appointments/mine", get(handlers::my_appointments))
        .route("/appointments/doctor", get(handlers::doctor_appointments))
        .route(
            "/appointments/:id/cancel",
            patch(handlers::cancel_appointment),
        )
        .route(
            "/appointments/:id/status",
            patch(handlers::update_appointment_status),
        )
        .route(
            "/appointments/:id/payments",
            post(handlers::record_payment),
        )
        .route(
            "/appointments/:id/payments",
            get(handlers::list_payments),
        )
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
