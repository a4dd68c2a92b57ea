//! # API Shared
//!
//! Shared utilities and definitions for the clinic APIs.
//!
//! Contains:
//! - Shared services like `HealthService`
//! - Authentication utilities (JWT issuing and verification)
//!
//! Used by `api-rest` for common functionality.

pub mod auth;
pub mod health;

pub use auth::{issue_token, verify_token, AuthError, Claims};
pub use health::{HealthRes, HealthService};
