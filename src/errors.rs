//! Error types for mnemos.

use thiserror::Error;

/// Main error type for mnemos operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input is empty or whitespace-only.
    #[error("Input cannot be empty")]
    EmptyInput,

    /// Input exceeds the accepted length.
    #[error("Input too long: {actual_length} bytes (max {max_length})")]
    InputTooLong {
        max_length: usize,
        actual_length: usize,
    },

    /// Any other rejected caller input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The embedding provider failed or returned an unusable vector.
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Embedding length disagrees with the store's established dimensionality.
    #[error("Dimension mismatch: expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The persistence backend could not complete a read or write.
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested memory does not exist.
    #[error("Memory not found: {0}")]
    NotFound(i64),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for every error the caller can fix by correcting its input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyInput | Error::InputTooLong { .. } | Error::Validation(_)
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
