//! Error types for carelog-core

use thiserror::Error;

use crate::types::RecordKind;

/// Main error type for the carelog-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A record failed validation on the write path
    #[error("invalid {kind} record {id}: {reason}")]
    InvalidRecord {
        kind: RecordKind,
        id: String,
        reason: String,
    },

    /// A record referenced by id does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },
}

/// Result type alias for carelog-core
pub type Result<T> = std::result::Result<T, Error>;
