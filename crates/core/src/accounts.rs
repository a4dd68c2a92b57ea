//! Accounts, roles and the authenticated principal.
//!
//! Registration and login over the users tree. Passwords are stored as bcrypt
//! hashes and never leave this module; token issuance is an API-layer concern.
//! Every other service receives a [`Principal`] — the id and role the identity
//! layer authenticated — and performs only ownership/role checks against it.

use crate::error::{ClinicError, ClinicResult};
use crate::store::{self, ClinicStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use std::sync::Arc;
use uuid::Uuid;

/// Role attached to an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ClinicError;

    fn from_str(s: &str) -> ClinicResult<Self> {
        match s {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            other => Err(ClinicError::Validation(format!("unknown role: {other}"))),
        }
    }
}

/// Authenticated caller, as established by the identity layer.
///
/// Core trusts this pair and applies only the authorization rules of the
/// individual operations (ownership, role gates).
#[derive(Clone, Copy, Debug)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

/// Require the admin role; used by the directory services' admin operations.
pub(crate) fn require_admin(principal: &Principal) -> ClinicResult<()> {
    if principal.role != Role::Admin {
        return Err(ClinicError::Forbidden);
    }
    Ok(())
}

/// Stored account document. The bcrypt hash stays inside core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub(crate) password_hash: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Input for [`AccountService::register`].
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Registration and login over the users collection.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<ClinicStore>,
}

impl AccountService {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    /// Register a new account.
    ///
    /// The email is the login identifier and must be unique; uniqueness is
    /// enforced by the `users_by_email` index inside a transaction, not by a
    /// check-then-insert.
    ///
    /// # Errors
    ///
    /// `Validation` for malformed fields, `AlreadyExists` when the email is
    /// taken, `PasswordHash` if hashing fails.
    pub fn register(&self, new: NewAccount) -> ClinicResult<UserAccount> {
        if new.username.trim().is_empty() {
            return Err(ClinicError::Validation("username is required".into()));
        }
        let email = normalize_email(&new.email)?;
        if new.password.len() < 8 {
            return Err(ClinicError::Validation(
                "password must be at least 8 characters".into(),
            ));
        }

        let password_hash =
            bcrypt::hash(&new.password, bcrypt::DEFAULT_COST).map_err(ClinicError::PasswordHash)?;

        let account = UserAccount {
            id: Uuid::new_v4(),
            username: new.username.trim().to_owned(),
            email: email.clone(),
            password_hash,
            phone: new.phone,
            role: new.role,
            created_at: Utc::now(),
        };
        let doc = store::encode_doc(&account)?;

        (self.store.users(), self.store.users_by_email())
            .transaction(|(users, by_email)| {
                if by_email.get(email.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        ClinicError::AlreadyExists("an account with this email"),
                    ));
                }
                by_email.insert(email.as_bytes(), account.id.as_bytes())?;
                users.insert(account.id.as_bytes(), doc.as_slice())?;
                Ok(())
            })
            .map_err(ClinicError::from)?;

        tracing::info!(user = %account.id, role = %account.role, "registered account");
        Ok(account)
    }

    /// Verify credentials and return the matching account.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown email, `Unauthorized` for a wrong password.
    pub fn login(&self, email: &str, password: &str) -> ClinicResult<UserAccount> {
        let email = normalize_email(email)?;
        let id = self
            .store
            .users_by_email()
            .get(email.as_bytes())?
            .ok_or(ClinicError::NotFound("account"))?;
        let account: UserAccount = store::get_doc(self.store.users(), &id)?
            .ok_or(ClinicError::NotFound("account"))?;

        let ok = bcrypt::verify(password, &account.password_hash)
            .map_err(ClinicError::PasswordHash)?;
        if !ok {
            return Err(ClinicError::Unauthorized);
        }

        Ok(account)
    }

    /// Fetch an account by id.
    pub fn get(&self, id: Uuid) -> ClinicResult<UserAccount> {
        store::get_doc(self.store.users(), id.as_bytes())?.ok_or(ClinicError::NotFound("account"))
    }
}

fn normalize_email(email: &str) -> ClinicResult<String> {
    let email = email.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ClinicError::Validation("a valid email is required".into()));
    }
    Ok(email)
}
