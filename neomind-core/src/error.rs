//! Error types for neomind.

use thiserror::Error;

/// Errors that can occur in neomind operations.
#[derive(Error, Debug)]
pub enum NeoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Permission denied for user '{0}'")]
    PermissionDenied(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Event ends ({end}) before it starts ({start})")]
    InvalidTimeRange { start: String, end: String },

    #[error("Field '{0}' is read-only for an existing event")]
    ReadOnlyField(&'static str),

    #[error("No event form is open")]
    NoOpenForm,

    #[error("AI request failed: {0}")]
    Ai(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for NeoError {
    fn from(err: serde_json::Error) -> Self {
        NeoError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for NeoError {
    fn from(err: reqwest::Error) -> Self {
        NeoError::Ai(err.to_string())
    }
}

/// Result type alias for neomind operations.
pub type NeoResult<T> = Result<T, NeoError>;
