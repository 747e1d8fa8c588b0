//! Error handling - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use licensing_core::LicensingError;
use licensing_shared::ErrorResponse;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Licensing could not be evaluated. Access is refused rather than
    /// granted.
    #[error("Licensing unavailable: {0}")]
    Licensing(LicensingError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Licensing(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_problem())
    }
}

impl AppError {
    /// Render the problem body, logging server-side failures.
    pub fn to_problem(&self) -> ErrorResponse {
        match self {
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Licensing(err) => {
                tracing::error!(error = %err, retryable = err.is_retryable(), "Licensing check failed");
                ErrorResponse::licensing_unavailable()
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        }
    }
}

impl From<LicensingError> for AppError {
    fn from(err: LicensingError) -> Self {
        match err {
            LicensingError::InvalidAmount => {
                AppError::BadRequest("amount must be a positive integer".to_string())
            }
            other => AppError::Licensing(other),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
