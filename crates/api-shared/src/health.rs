use serde::Serialize;
use utoipa::ToSchema;

/// Health check response body.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service shared by the clinic APIs.
///
/// Provides a standardised way to check the health status of the clinic
/// system.
#[derive(Clone)]
pub struct HealthService;

impl HealthService {
    /// Health status of the service.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "clinic is alive".into(),
        }
    }
}
