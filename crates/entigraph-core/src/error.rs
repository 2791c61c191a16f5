//! Error types for entigraph.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using entigraph's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for entigraph operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Candidate lookup could not run (storage unavailable)
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// External entity extraction call failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// External arbitration call failed or timed out
    #[error("Arbitration error: {0}")]
    Arbitration(String),

    /// Insert/update/link failed for a single draft
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Entity does not exist or is not owned by the requesting user
    #[error("Entity not owned: {0}")]
    EntityNotOwned(Uuid),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is a caller mistake rather than an internal
    /// failure. Boundary layers map these to specific validation messages
    /// and everything else to a generic failure message.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::EntityNotOwned(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
