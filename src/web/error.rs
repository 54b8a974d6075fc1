//! API error handling for the HTTP surface.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::DocError;

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Forbidden (403).
    Forbidden,
    /// Not found (404).
    NotFound,
    /// Payload too large (413).
    PayloadTooLarge,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub message: String,
    /// Editor callback envelope code (1 = rejected), only on callback errors.
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub callback_error: Option<u8>,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    callback_error: Option<u8>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            callback_error: None,
        }
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a payload too large error.
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PayloadTooLarge, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Attach the editor callback envelope code.
    pub fn with_callback_error(mut self, code: u8) -> Self {
        self.callback_error = Some(code);
        self
    }

    /// Error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            message: self.message,
            callback_error: self.callback_error,
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<DocError> for ApiError {
    fn from(err: DocError) -> Self {
        match err {
            DocError::NotFound(_) => ApiError::not_found("file not found"),
            DocError::UnsupportedType(_) => ApiError::bad_request("unsupported file type"),
            DocError::Validation(msg) => ApiError::bad_request(msg),
            DocError::Forbidden { message, source } => {
                match &source {
                    Some(cause) => tracing::warn!(cause = %cause, "{}", message),
                    None => tracing::warn!("{}", message),
                }
                ApiError::forbidden(message)
            }
            DocError::Io(e) => {
                tracing::error!("I/O error: {}", e);
                ApiError::internal(e.to_string())
            }
            DocError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                ApiError::internal(msg)
            }
            DocError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                ApiError::internal(msg)
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large("upload too large")
        } else {
            tracing::debug!("Failed to read multipart data: {}", err);
            ApiError::bad_request(format!("invalid multipart data: {}", err.body_text()))
        }
    }
}
