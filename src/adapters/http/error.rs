//! API error handling shared by all HTTP modules.
//!
//! Every handler returns `Result<_, ApiError>`; the error carries the
//! domain error through and maps its code onto an HTTP status at the
//! response boundary.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::domain::billing::WebhookError;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(DomainError);

impl ApiError {
    /// Authentication failure for extractors.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self(DomainError::new(ErrorCode::Unauthenticated, message))
    }

    /// Authorization failure for extractors.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(DomainError::new(ErrorCode::Unauthorized, message))
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        let code = match err {
            WebhookError::ParseError(_) => ErrorCode::ValidationFailed,
            _ => ErrorCode::Unauthenticated,
        };
        Self(DomainError::new(code, err.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat
            | ErrorCode::InvalidCoupon => StatusCode::BAD_REQUEST,
            ErrorCode::AccountNotFound | ErrorCode::CouponNotFound => StatusCode::NOT_FOUND,
            ErrorCode::DuplicateAccount | ErrorCode::ConcurrencyConflict => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::FORBIDDEN,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let details = if self.0.details.is_empty() {
            None
        } else {
            serde_json::to_value(&self.0.details).ok()
        };

        let body = ErrorResponse {
            error_code: self.0.code.to_string(),
            message: self.0.message,
            details,
        };
        (status, Json(body)).into_response()
    }
}
