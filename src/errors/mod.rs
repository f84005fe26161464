//! Error handling module for the intake service.
//!
//! Provides centralized error types with mapping to HTTP status codes and the
//! `{ok:false, error}` response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const METHOD_NOT_ALLOWED: &str = "METHOD_NOT_ALLOWED";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const RENDER_ERROR: &str = "RENDER_ERROR";
    pub const SHEETS_ERROR: &str = "SHEETS_ERROR";
    pub const MAIL_ERROR: &str = "MAIL_ERROR";
    pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// One or more required draft fields are missing or invalid
    #[error("{0}")]
    Validation(String),
    /// Required service configuration is absent or unusable
    #[error("{0}")]
    Configuration(String),
    /// The form is not in a state that accepts the request
    #[error("{0}")]
    Conflict(String),
    /// Resource not found
    #[error("{0}")]
    NotFound(String),
    /// HTTP method not accepted by the route
    #[error("method not allowed")]
    MethodNotAllowed,
    /// Malformed request body
    #[error("{0}")]
    BadRequest(String),
    /// Document rendering failed
    #[error("{0}")]
    Render(String),
    /// Spreadsheet service call failed
    #[error("{0}")]
    Sheets(String),
    /// Mail composition or delivery failed
    #[error("{0}")]
    Mail(String),
    /// Outbound HTTP call failed
    #[error("{0}")]
    Transport(String),
    /// Database error
    #[error("{0}")]
    Database(String),
    /// Internal server error
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Configuration(_)
            | AppError::Render(_)
            | AppError::Sheets(_)
            | AppError::Mail(_)
            | AppError::Transport(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Configuration(_) => codes::CONFIGURATION_ERROR,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::MethodNotAllowed => codes::METHOD_NOT_ALLOWED,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::Render(_) => codes::RENDER_ERROR,
            AppError::Sheets(_) => codes::SHEETS_ERROR,
            AppError::Mail(_) => codes::MAIL_ERROR,
            AppError::Transport(_) => codes::TRANSPORT_ERROR,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<lopdf::Error> for AppError {
    fn from(err: lopdf::Error) -> Self {
        AppError::Render(format!("PDF error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(format!("HTTP error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Configuration(format!("Service account key error: {}", err))
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(err: lettre::error::Error) -> Self {
        AppError::Mail(format!("Mail build error: {}", err))
    }
}

impl From<lettre::address::AddressError> for AppError {
    fn from(err: lettre::address::AddressError) -> Self {
        AppError::Mail(format!("Invalid mail address: {}", err))
    }
}

impl From<lettre::transport::smtp::Error> for AppError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        AppError::Mail(format!("SMTP error: {}", err))
    }
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            ok: false,
            error: error.to_string(),
            code: error.error_code().to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        }
        (status, Json(ErrorResponse::new(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AppError::Configuration("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_method_not_allowed_message() {
        let body = ErrorResponse::new(&AppError::MethodNotAllowed);
        assert!(!body.ok);
        assert_eq!(body.error, "method not allowed");
        assert_eq!(body.code, codes::METHOD_NOT_ALLOWED);
    }
}
