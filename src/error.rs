//! Error types for docdesk.

use thiserror::Error;

/// Common error type for docdesk.
#[derive(Error, Debug)]
pub enum DocError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The file extension is not in the supported list.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// Validation error for client input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Signature missing or rejected.
    #[error("forbidden: {message}")]
    Forbidden {
        /// Human-readable reason.
        message: String,
        /// Last verification failure, if any.
        #[source]
        source: Option<jsonwebtoken::errors::Error>,
    },

    /// Failure talking to the external editor.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DocError {
    /// Create a forbidden error without an underlying cause.
    pub fn forbidden(message: impl Into<String>) -> Self {
        DocError::Forbidden {
            message: message.into(),
            source: None,
        }
    }
}

/// Result type alias for docdesk operations.
pub type Result<T> = std::result::Result<T, DocError>;
