//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core
//! services behind an `Arc`. Request handling never reads process-wide
//! environment variables, which keeps behaviour consistent across
//! multi-threaded runtimes and test harnesses, and there is no module-level
//! database handle: the store is constructed explicitly from this config and
//! handed to each service.

use crate::error::{ClinicError, ClinicResult};
use std::path::{Path, PathBuf};

const DB_DIR_NAME: &str = "clinic.sled";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    default_duration_minutes: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Validation` if `default_duration_minutes` is zero.
    pub fn new(data_dir: PathBuf, default_duration_minutes: u32) -> ClinicResult<Self> {
        if default_duration_minutes == 0 {
            return Err(ClinicError::Validation(
                "default appointment duration must be positive".into(),
            ));
        }

        Ok(Self {
            data_dir,
            default_duration_minutes,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the embedded database under the data directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_DIR_NAME)
    }

    /// Appointment duration applied when a booking does not specify one.
    pub fn default_duration_minutes(&self) -> u32 {
        self.default_duration_minutes
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/clinic_data"),
            default_duration_minutes: 30,
        }
    }
}
