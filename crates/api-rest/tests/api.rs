//! End-to-end HTTP tests over the full router: register accounts, set up
//! profiles, book and pay, all through JSON requests against an in-memory
//! store.

use api_rest::{router, AppState};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use clinic_core::{ClinicStore, CoreConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn app() -> Router {
    let store = Arc::new(ClinicStore::temporary().expect("temporary store"));
    let cfg = Arc::new(CoreConfig::default());
    router(AppState::new(store, cfg, SECRET))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.expect("request");
    let status = res.status();
    let bytes = res.into_body().collect().await.expect("body").to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn post_json(path: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    json_req("POST", path, token, body)
}

fn json_req(method: &str, path: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request body")
}

fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

/// Register an account and return its token.
async fn register(app: &Router, username: &str, email: &str, role: &str) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/auth/register",
            None,
            &json!({
                "username": username,
                "email": email,
                "password": "hunter2hunter2",
                "role": role,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register: {body}");
    body["token"].as_str().expect("token").to_owned()
}

/// Full setup: an approved doctor (returning their profile id and token) and
/// a patient with a profile.
async fn clinic_with_doctor_and_patient(app: &Router) -> (String, String, String, String) {
    let admin = register(app, "admin", "admin@clinic.test", "admin").await;
    let doctor = register(app, "drkhan", "khan@clinic.test", "doctor").await;
    let patient = register(app, "asha", "asha@clinic.test", "patient").await;

    let (status, body) = send(
        app,
        post_json(
            "/doctors",
            Some(&doctor),
            &json!({
                "specialization": "Cardiology",
                "experience_years": 10,
                "hospital_name": "General Hospital",
                "consultation_fee": "1000",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "doctor profile: {body}");
    let doctor_id = body["id"].as_str().expect("doctor id").to_owned();

    let (status, body) = send(
        app,
        json_req(
            "PUT",
            &format!("/doctors/{doctor_id}/approve"),
            Some(&admin),
            &json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "approve: {body}");

    let (status, body) = send(
        app,
        post_json(
            "/patients",
            Some(&patient),
            &json!({
                "name": "Asha Rao",
                "age": 34,
                "gender": "female",
                "blood_group": "O+",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "patient profile: {body}");

    (admin, doctor, patient, doctor_id)
}

fn future_slot() -> String {
    (chrono::Utc::now() + chrono::Duration::days(2))
        .to_rfc3339()
}

#[tokio::test]
async fn health_is_open() {
    let app = app();
    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn protected_routes_reject_missing_and_garbage_tokens() {
    let app = app();
    let (status, _) = send(&app, get("/patients/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/patients/me", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_registration_conflicts() {
    let app = app();
    register(&app, "asha", "asha@clinic.test", "patient").await;
    let (status, body) = send(
        &app,
        post_json(
            "/auth/register",
            None,
            &json!({
                "username": "asha2",
                "email": "Asha@Clinic.Test",
                "password": "hunter2hunter2",
                "role": "patient",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[tokio::test]
async fn login_distinguishes_unknown_email_from_wrong_password() {
    let app = app();
    register(&app, "asha", "asha@clinic.test", "patient").await;

    let (status, _) = send(
        &app,
        post_json(
            "/auth/login",
            None,
            &json!({"email": "nobody@clinic.test", "password": "hunter2hunter2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        post_json(
            "/auth/login",
            None,
            &json!({"email": "asha@clinic.test", "password": "wrong-password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_and_double_booking_over_http() {
    let app = app();
    let (_, _, patient, doctor_id) = clinic_with_doctor_and_patient(&app).await;
    let slot = future_slot();

    let (status, body) = send(
        &app,
        post_json(
            "/appointments",
            Some(&patient),
            &json!({"doctor_id": doctor_id, "scheduled_at": slot}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], json!("pending"));
    assert_eq!(body["payment_status"], json!("pending"));

    // Same minute, second patient: conflict.
    let other = register(&app, "vik", "vik@clinic.test", "patient").await;
    let (status, body) = send(
        &app,
        post_json(
            "/patients",
            Some(&other),
            &json!({"name": "Vikram Shah", "age": 41, "gender": "male", "blood_group": "B+"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = send(
        &app,
        post_json(
            "/appointments",
            Some(&other),
            &json!({"doctor_id": doctor_id, "scheduled_at": slot}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[tokio::test]
async fn past_schedule_is_a_bad_request() {
    let app = app();
    let (_, _, patient, doctor_id) = clinic_with_doctor_and_patient(&app).await;
    let past = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();

    let (status, body) = send(
        &app,
        post_json(
            "/appointments",
            Some(&patient),
            &json!({"doctor_id": doctor_id, "scheduled_at": past}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn installment_payments_confirm_the_appointment() {
    let app = app();
    let (_, _, patient, doctor_id) = clinic_with_doctor_and_patient(&app).await;

    let (status, body) = send(
        &app,
        post_json(
            "/appointments",
            Some(&patient),
            &json!({"doctor_id": doctor_id, "scheduled_at": future_slot()}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let appointment_id = body["id"].as_str().expect("appointment id").to_owned();

    let (status, body) = send(
        &app,
        post_json(
            &format!("/appointments/{appointment_id}/payments"),
            Some(&patient),
            &json!({"amount": "400", "method": "upi", "transaction_id": "txn-1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["appointment"]["payment_status"], json!("partial"));
    assert_eq!(body["appointment"]["status"], json!("pending"));

    let (status, body) = send(
        &app,
        post_json(
            &format!("/appointments/{appointment_id}/payments"),
            Some(&patient),
            &json!({"amount": "600", "method": "card", "transaction_id": "txn-2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["appointment"]["payment_status"], json!("paid"));
    assert_eq!(body["appointment"]["status"], json!("confirmed"));

    // Overpay after settlement: 422.
    let (status, _) = send(
        &app,
        post_json(
            &format!("/appointments/{appointment_id}/payments"),
            Some(&patient),
            &json!({"amount": "1", "method": "cash", "transaction_id": "txn-3"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &app,
        get(&format!("/appointments/{appointment_id}/payments"), Some(&patient)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 2);
}

#[tokio::test]
async fn capability_table_guards_patient_updates() {
    let app = app();
    let (_, doctor, patient, _) = clinic_with_doctor_and_patient(&app).await;

    // A patient may not touch their own blood group.
    let (status, body) = send(
        &app,
        json_req(
            "PUT",
            "/patients/me",
            Some(&patient),
            &json!({"blood_group": "AB+"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    // But may rename themselves.
    let (status, body) = send(
        &app,
        json_req("PUT", "/patients/me", Some(&patient), &json!({"name": "Asha R."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], json!("Asha R."));

    // A doctor updates allergies on the patient's profile by id.
    let patient_id = body["id"].as_str().expect("patient id").to_owned();
    let (status, body) = send(
        &app,
        json_req(
            "PUT",
            &format!("/patients/{patient_id}"),
            Some(&doctor),
            &json!({"allergies": ["penicillin"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["allergies"], json!(["penicillin"]));
}

#[tokio::test]
async fn doctor_listing_hides_unapproved_profiles() {
    let app = app();
    let doctor = register(&app, "drnew", "new@clinic.test", "doctor").await;
    let (status, body) = send(
        &app,
        post_json(
            "/doctors",
            Some(&doctor),
            &json!({
                "specialization": "Dermatology",
                "experience_years": 3,
                "hospital_name": "City Clinic",
                "consultation_fee": "300",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = send(&app, get("/doctors", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(0), "unapproved doctor must be hidden");
}

#[tokio::test]
async fn status_updates_are_doctor_only_over_http() {
    let app = app();
    let (_, doctor, patient, doctor_id) = clinic_with_doctor_and_patient(&app).await;

    let (status, body) = send(
        &app,
        post_json(
            "/appointments",
            Some(&patient),
            &json!({"doctor_id": doctor_id, "scheduled_at": future_slot()}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let appointment_id = body["id"].as_str().expect("appointment id").to_owned();

    // The patient may not drive the lifecycle.
    let (status, _) = send(
        &app,
        json_req(
            "PATCH",
            &format!("/appointments/{appointment_id}/status"),
            Some(&patient),
            &json!({"status": "confirmed"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        json_req(
            "PATCH",
            &format!("/appointments/{appointment_id}/status"),
            Some(&doctor),
            &json!({"status": "confirmed"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], json!("confirmed"));

    // The patient can still cancel their own appointment.
    let (status, body) = send(
        &app,
        json_req(
            "PATCH",
            &format!("/appointments/{appointment_id}/cancel"),
            Some(&patient),
            &json!({"reason": "travel"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], json!("cancelled"));
    assert_eq!(body["cancellation"]["cancelled_by"], json!("patient"));
}
