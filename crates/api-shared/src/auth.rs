//! JWT issuing and verification.
//!
//! Tokens carry the account id and role; verification yields a
//! [`Principal`] ready for the core services' access checks.

use chrono::{Duration, Utc};
use clinic_core::{Principal, Role};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long an issued token stays valid.
const TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("unknown role in token: {0}")]
    UnknownRole(String),
}

/// Claims embedded in an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: Uuid,
    /// Account role, as its lowercase wire name.
    pub role: String,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Issue a signed access token for an account.
pub fn issue_token(secret: &[u8], account_id: Uuid, role: Role) -> Result<String, AuthError> {
    let claims = Claims {
        sub: account_id,
        role: role.as_str().to_owned(),
        exp: (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}

/// Verify a token and extract the calling principal.
///
/// Fails on a bad signature, an expired token or an unrecognised role.
pub fn verify_token(secret: &[u8], token: &str) -> Result<Principal, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )?;
    let role: Role = data
        .claims
        .role
        .parse()
        .map_err(|_| AuthError::UnknownRole(data.claims.role))?;
    Ok(Principal {
        id: data.claims.sub,
        role,
    })
}
