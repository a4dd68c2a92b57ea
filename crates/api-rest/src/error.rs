//! Mapping from core errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use clinic_core::ClinicError;
use serde_json::json;

/// Wrapper so core errors can be returned straight from handlers with `?`.
pub struct ApiError(pub ClinicError);

impl From<ClinicError> for ApiError {
    fn from(e: ClinicError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            ClinicError::Validation(_)
            | ClinicError::InvalidAmount
            | ClinicError::PastSchedule
            | ClinicError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            ClinicError::Unauthorized => StatusCode::UNAUTHORIZED,
            ClinicError::Forbidden => StatusCode::FORBIDDEN,
            ClinicError::NotFound(_) => StatusCode::NOT_FOUND,
            ClinicError::SlotConflict
            | ClinicError::DuplicateTransaction
            | ClinicError::AlreadyExists(_) => StatusCode::CONFLICT,
            ClinicError::InvalidTransition { .. }
            | ClinicError::Overpayment
            | ClinicError::AlreadyPaid => StatusCode::UNPROCESSABLE_ENTITY,
            ClinicError::Storage(_)
            | ClinicError::Serialization(_)
            | ClinicError::Deserialization(_)
            | ClinicError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {:?}", self.0);
            // Internal details stay out of the response body.
            return (status, Json(json!({ "error": "internal error" }))).into_response();
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
