//! Core error types for bigtimer-core.
//!
//! Only genuine failures live here. Out-of-range time input is clamped and
//! a denied timer start is an ordinary [`Decision`](crate::Decision), so
//! neither shows up in this hierarchy.

use std::path::PathBuf;
use thiserror::Error;

use crate::entitlement::Plan;

/// Core error type for bigtimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Hosted checkout errors
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another writer
    #[error("Database is locked")]
    Locked,

    /// The store refused the write (quota, read-only medium, injected failure)
    #[error("Write rejected for key '{key}': {message}")]
    WriteRejected { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not determine or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDirUnavailable(String),

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Hosted checkout errors. Every variant carries a message fit for display.
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Plan identifier is not one of monthly/yearly/lifetime
    #[error("Unknown plan '{0}'")]
    UnknownPlan(String),

    /// No usable price id is configured for the plan
    #[error("Payment failed. No price is configured for the {0} plan.")]
    PriceNotConfigured(Plan),

    /// The checkout provider could not be reached or rejected the session
    #[error("Payment system unavailable. Please try again later. ({0})")]
    Unavailable(String),

    /// The return location could not be understood
    #[error("Invalid checkout return: {0}")]
    InvalidReturn(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
