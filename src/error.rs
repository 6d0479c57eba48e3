//! # Error Handling
//!
//! This module defines the application's error type and how each variant is
//! turned into an HTTP response.
//!
//! ## The error envelope
//! Every failure, whatever its cause, reaches the client in the same shape:
//! ```json
//! { "success": false, "error": "No audio file provided" }
//! ```
//!
//! ## Key Rust Concepts:
//! - **enum variants**: one variant per failure category, each carrying a message
//! - **ResponseError trait**: actix-web calls `error_response()` whenever a handler
//!   returns `Err(AppError)`, so handlers can simply use `?`
//! - **From trait**: lets `?` convert library errors (io, multipart) into `AppError`
//!
//! ## Internal errors stay internal
//! `Internal` carries a detailed message for the server log only.
//! Clients always see the generic "Internal server error".

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use tracing::error;

/// Message returned to clients for every 5xx response.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";

/// Custom error types for the application.
///
/// ## Status Code Mapping:
/// - **ValidationError / UnsupportedMediaType / PayloadTooLarge / MissingFile** → 400
/// - **NotFound** → 404
/// - **Internal** → 500
///
/// ## Usage Example:
/// ```rust
/// return Err(AppError::ValidationError("Message is required".to_string()));
/// ```
#[derive(Debug)]
pub enum AppError {
    /// Client sent missing or malformed input
    ValidationError(String),

    /// Uploaded file declared a content type outside the allowed audio set
    UnsupportedMediaType(String),

    /// Uploaded file exceeded the configured size limit
    PayloadTooLarge(String),

    /// Upload request carried no `audio` file part
    MissingFile(String),

    /// Requested route does not exist
    NotFound(String),

    /// Anything unexpected (I/O failures, bugs)
    Internal(String),
}

/// JSON body for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

impl AppError {
    pub fn unsupported_media_type() -> Self {
        AppError::UnsupportedMediaType("Invalid file type. Only audio files are allowed.".to_string())
    }

    pub fn payload_too_large(limit_bytes: u64) -> Self {
        AppError::PayloadTooLarge(format!(
            "File too large. Maximum size is {} bytes.",
            limit_bytes
        ))
    }

    pub fn missing_file() -> Self {
        AppError::MissingFile("No audio file provided".to_string())
    }

    /// The message that is safe to show to API clients.
    ///
    /// 4xx variants echo their message; 5xx variants hide the detail.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::UnsupportedMediaType(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::MissingFile(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::Internal(_) => GENERIC_INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::UnsupportedMediaType(msg) => write!(f, "Unsupported media type: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::MissingFile(msg) => write!(f, "Missing file: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts our custom errors into HTTP responses.
///
/// The detailed message of a 5xx error is logged here, at the single point
/// where it is dropped from the response.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::UnsupportedMediaType(_)
            | AppError::PayloadTooLarge(_)
            | AppError::MissingFile(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed with internal error");
        }

        HttpResponse::build(status).json(ErrorEnvelope::new(self.public_message()))
    }
}

/// Filesystem failures while storing or cleaning up uploads are server-side problems.
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("I/O error: {}", err))
    }
}

/// A malformed multipart body is the client's fault.
impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::ValidationError(format!("Multipart error: {}", err))
    }
}

/// Shorthand for `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_validation_errors_are_bad_requests() {
        for err in [
            AppError::ValidationError("Message is required".to_string()),
            AppError::unsupported_media_type(),
            AppError::payload_too_large(10),
            AppError::missing_file(),
        ] {
            let expected = err.public_message();
            let (status, body) = body_json(err).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], expected);
        }
    }

    #[actix_web::test]
    async fn test_internal_errors_hide_details() {
        let (status, body) = body_json(AppError::Internal("disk on fire at /var/x".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], GENERIC_INTERNAL_MESSAGE);
    }

    #[test]
    fn test_conversions() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = AppError::from(io);
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.public_message(), GENERIC_INTERNAL_MESSAGE);
    }

    #[test]
    fn test_payload_too_large_names_limit() {
        let err = AppError::payload_too_large(10 * 1024 * 1024);
        assert!(err.public_message().contains("10485760"));
    }
}
