//! Request extractors.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use clinic_core::Principal;
use serde_json::json;

use crate::AppState;

/// The authenticated caller, extracted from the `Authorization: Bearer`
/// header. Handlers that take an [`Auth`] argument reject unauthenticated
/// requests with 401 before any domain logic runs.
pub struct Auth(pub Principal);

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": message })),
    )
        .into_response()
}

#[async_trait]
impl FromRequestParts<AppState> for Auth {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("expected a bearer token"))?;

        let principal = api_shared::verify_token(state.token_secret.as_bytes(), token)
            .map_err(|e| {
                tracing::debug!("token rejected: {e}");
                unauthorized("invalid or expired token")
            })?;
        Ok(Auth(principal))
    }
}
