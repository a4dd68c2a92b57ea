//! Embedded document store.
//!
//! One sled database holds every collection, each in its own named tree.
//! Documents are JSON-encoded; ids are UUID bytes. Alongside the primary
//! collections there are secondary-index trees that exist purely to enforce
//! uniqueness at the persistence layer:
//!
//! - `users_by_email` — one account per email address
//! - `doctors_by_user` / `patients_by_user` — one profile per account
//! - `slots` — one appointment per `(doctor, minute)` pair
//! - `payments_by_txn` — globally unique payment transaction ids
//!
//! Multi-document atomicity (booking with deposit, incremental payment) is
//! built on sled's serializable multi-tree transactions; the services in
//! `booking` and `ledger` run their closures against the trees exposed here.

use crate::config::CoreConfig;
use crate::error::{ClinicError, ClinicResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::ConflictableTransactionError;
use std::fs;

/// Handle to the clinic database with all trees opened up front.
///
/// Cheap to clone via `Arc` at the service layer; constructed once at startup
/// from [`CoreConfig`] and torn down with [`ClinicStore::flush`].
pub struct ClinicStore {
    db: sled::Db,
    users: sled::Tree,
    users_by_email: sled::Tree,
    doctors: sled::Tree,
    doctors_by_user: sled::Tree,
    patients: sled::Tree,
    patients_by_user: sled::Tree,
    appointments: sled::Tree,
    slots: sled::Tree,
    payments: sled::Tree,
    payments_by_txn: sled::Tree,
}

impl ClinicStore {
    /// Open (or create) the database under the configured data directory.
    pub fn open(cfg: &CoreConfig) -> ClinicResult<Self> {
        fs::create_dir_all(cfg.data_dir()).map_err(|e| {
            ClinicError::Validation(format!(
                "cannot create data directory {}: {e}",
                cfg.data_dir().display()
            ))
        })?;

        let db = sled::Config::new()
            .path(cfg.db_path())
            .flush_every_ms(Some(1000))
            .open()?;
        Self::with_db(db)
    }

    /// In-memory database for tests; dropped state is discarded.
    pub fn temporary() -> ClinicResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::with_db(db)
    }

    fn with_db(db: sled::Db) -> ClinicResult<Self> {
        Ok(Self {
            users: db.open_tree(b"users")?,
            users_by_email: db.open_tree(b"users_by_email")?,
            doctors: db.open_tree(b"doctors")?,
            doctors_by_user: db.open_tree(b"doctors_by_user")?,
            patients: db.open_tree(b"patients")?,
            patients_by_user: db.open_tree(b"patients_by_user")?,
            appointments: db.open_tree(b"appointments")?,
            slots: db.open_tree(b"slots")?,
            payments: db.open_tree(b"payments")?,
            payments_by_txn: db.open_tree(b"payments_by_txn")?,
            db,
        })
    }

    /// Flush all dirty buffers to disk. Intended for shutdown.
    pub fn flush(&self) -> ClinicResult<()> {
        self.db.flush()?;
        Ok(())
    }

    pub(crate) fn users(&self) -> &sled::Tree {
        &self.users
    }

    pub(crate) fn users_by_email(&self) -> &sled::Tree {
        &self.users_by_email
    }

    pub(crate) fn doctors(&self) -> &sled::Tree {
        &self.doctors
    }

    pub(crate) fn doctors_by_user(&self) -> &sled::Tree {
        &self.doctors_by_user
    }

    pub(crate) fn patients(&self) -> &sled::Tree {
        &self.patients
    }

    pub(crate) fn patients_by_user(&self) -> &sled::Tree {
        &self.patients_by_user
    }

    pub(crate) fn appointments(&self) -> &sled::Tree {
        &self.appointments
    }

    pub(crate) fn slots(&self) -> &sled::Tree {
        &self.slots
    }

    pub(crate) fn payments(&self) -> &sled::Tree {
        &self.payments
    }

    pub(crate) fn payments_by_txn(&self) -> &sled::Tree {
        &self.payments_by_txn
    }
}

/// Encode a document for storage.
pub(crate) fn encode_doc<T: Serialize>(doc: &T) -> ClinicResult<Vec<u8>> {
    serde_json::to_vec(doc).map_err(ClinicError::Serialization)
}

/// Decode a stored document.
pub(crate) fn decode_doc<T: DeserializeOwned>(bytes: &[u8]) -> ClinicResult<T> {
    serde_json::from_slice(bytes).map_err(ClinicError::Deserialization)
}

/// Decode inside a transaction closure, aborting the transaction on failure.
pub(crate) fn decode_in_txn<T: DeserializeOwned>(
    bytes: &[u8],
) -> Result<T, ConflictableTransactionError<ClinicError>> {
    serde_json::from_slice(bytes)
        .map_err(|e| ConflictableTransactionError::Abort(ClinicError::Deserialization(e)))
}

/// Encode inside a transaction closure, aborting the transaction on failure.
pub(crate) fn encode_in_txn<T: Serialize>(
    doc: &T,
) -> Result<Vec<u8>, ConflictableTransactionError<ClinicError>> {
    serde_json::to_vec(doc)
        .map_err(|e| ConflictableTransactionError::Abort(ClinicError::Serialization(e)))
}

/// Fetch and decode a document by key.
pub(crate) fn get_doc<T: DeserializeOwned>(
    tree: &sled::Tree,
    key: &[u8],
) -> ClinicResult<Option<T>> {
    match tree.get(key)? {
        Some(bytes) => Ok(Some(decode_doc(&bytes)?)),
        None => Ok(None),
    }
}

/// Encode and store a document under a key.
pub(crate) fn put_doc<T: Serialize>(tree: &sled::Tree, key: &[u8], doc: &T) -> ClinicResult<()> {
    tree.insert(key, encode_doc(doc)?)?;
    Ok(())
}

/// Decode every document in a tree.
///
/// Collections here are small enough that listing endpoints scan and filter;
/// sorting and pagination happen at the service layer.
pub(crate) fn scan_docs<T: DeserializeOwned>(tree: &sled::Tree) -> ClinicResult<Vec<T>> {
    let mut docs = Vec::new();
    for entry in tree.iter() {
        let (_, bytes) = entry?;
        docs.push(decode_doc(&bytes)?);
    }
    Ok(docs)
}
