//! Core error types for chunkcal-core.
//!
//! Scheduling, storage and configuration each get their own thiserror enum;
//! [`CoreError`] wraps them for callers that don't care which layer failed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for chunkcal-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Scheduling errors
    #[error("Scheduling error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Chunk store errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

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

/// Structural failures of a scheduling call.
///
/// Chunks that simply don't fit are not errors; they are reported through
/// [`crate::scheduler::ScheduleOutcome::unplaced`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// No chunks were supplied.
    #[error("No chunks to schedule")]
    EmptyInput,

    /// Work window is empty after parsing and defaulting.
    #[error("Invalid work window: start hour {start} must be before end hour {end}")]
    InvalidWorkWindow { start: i32, end: i32 },

    /// Target date is not `YYYY-MM-DD`.
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Chunk store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Stored JSON column could not be decoded
    #[error("Malformed stored value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Chunk not found: {0}")]
    ChunkNotFound(String),

    /// The chunk exists but belongs to another user's project.
    #[error("Chunk {chunk_id} is not owned by user {user_id}")]
    NotOwned { chunk_id: String, user_id: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[from] std::io::Error),
}

impl StoreError {
    /// Map a rusqlite error, surfacing lock contention separately.
    pub fn from_sqlite(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg)
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                StoreError::Locked
            }
            _ => StoreError::Database(err),
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        StoreError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
