//! Core error types for brewvat-core.
//!
//! One thiserror hierarchy: a top-level `CoreError` that domain-specific
//! enums convert into, so callers can match on exactly the failures they
//! care about and `?` the rest upward.

use std::path::PathBuf;
use thiserror::Error;

use crate::lifecycle::BrewCommand;
use crate::lock::LockHolder;
use crate::recipe::BrewStatus;

/// Core error type for brewvat-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Backing store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Lifecycle transition errors
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the shared backing store.
///
/// These are transient I/O-level failures; the core never retries them
/// automatically -- retry is a manual user action.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Store is locked")]
    Locked,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Rejections and failures of lifecycle commands.
///
/// Every variant leaves the recipe's status and the lock untouched: a
/// command either commits completely or reports why it did nothing.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The requested command is not valid from the recipe's current status.
    #[error("cannot {command} a {status} recipe")]
    IllegalTransition {
        status: BrewStatus,
        command: BrewCommand,
    },

    /// Another recipe is live on the shared sensor. The caller must retry
    /// after that session pauses or completes.
    #[error("sensor is busy: {holder} is already brewing")]
    LockHeldByOther { holder: LockHolder },

    #[error("recipe not found: {0}")]
    RecipeNotFound(String),

    /// The backing store could not be read or written.
    #[error("backing store unavailable: {0}")]
    Unavailable(#[from] StoreError),
}

/// Some, but not all, of a recipe's sample history failed to delete
/// during a reset to draft.
///
/// Non-fatal: the status transition proceeds anyway, because releasing the
/// hardware lock is the correctness-critical half of that operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[error("purged {deleted} sample(s) but {failed} could not be deleted")]
pub struct PartialPurgeFailure {
    pub deleted: usize,
    pub failed: usize,
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Push delivery failures. Always best-effort: the alert pipeline logs
/// these and moves on, they never surface to the triggering flow.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Notifications disabled, unauthorized, or no channel configured.
    #[error("notification channel unavailable")]
    Unavailable,

    #[error("notification delivery failed: {0}")]
    Failed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
