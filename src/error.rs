//! Error types for rootcache
//!
//! All modules use `RootCacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error produced by a [`crate::state::StateCodec`]
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for rootcache operations
pub type RootCacheResult<T> = Result<T, RootCacheError>;

/// All errors that can occur in rootcache
#[derive(Error, Debug)]
pub enum RootCacheError {
    // Lock state errors
    #[error("State cache is not locked")]
    NotLocked,

    #[error("State cache is already locked for server {0}")]
    AlreadyLocked(String),

    #[error("Cache is locked for server {locked}, not {requested}")]
    ServerMismatch { locked: String, requested: String },

    #[error("Timed out after {waited_secs}s waiting for the state file lock of server {server}")]
    LockTimeout { server: String, waited_secs: u64 },

    // Entry errors
    #[error("No previous state found for database {database}")]
    PreviousStateNotFound { database: String },

    #[error("Local state for database {database} is corrupted: {reason}")]
    LocalStateCorrupted { database: String, reason: String },

    #[error("Invalid server identity {identity:?}: {reason}")]
    InvalidServerIdentity { identity: String, reason: String },

    #[error("Invalid database name {name:?}: {reason}")]
    InvalidDatabaseName { name: String, reason: String },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[source] CodecError),

    #[error(
        "Rollback detected for database {database}: cached tx {cached_tx}, offered tx {offered_tx}"
    )]
    Rollback {
        database: String,
        cached_tx: u64,
        offered_tx: u64,
    },

    #[error("Invalid hex digest {value:?}: {reason}")]
    InvalidDigest { value: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RootCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a corruption error for a database entry
    pub fn corrupted(database: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LocalStateCorrupted {
            database: database.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is the expected "first contact" outcome
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::PreviousStateNotFound { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PreviousStateNotFound { .. } => {
                Some("No state has been recorded yet. Run: rootcache set <server> <db> ...")
            }
            Self::LocalStateCorrupted { .. } => {
                Some("Reset the entry with: rootcache forget <server> <db>")
            }
            Self::LockTimeout { .. } => {
                Some("Another process holds the lock. Raise cache.lock_timeout_secs or retry")
            }
            Self::Rollback { .. } => Some("The server offered an older state. Do not trust it"),
            _ => None,
        }
    }
}
