//! Common error types used throughout dashvault.
//!
//! Expected failure modes (missing clips, malformed requests) are modeled as
//! values so they can be mapped to HTTP statuses at the boundary; only
//! genuine programming errors should escalate past these variants.

/// Common error type for dashvault.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested clip or artifact was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input was provided (bad camera name, malformed timestamp, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
