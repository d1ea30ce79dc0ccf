// Response types for API endpoints

use crate::core::errors::{AccountError, ExceptionType};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_type: ExceptionType,
    pub msg: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub redis: String,
    pub database: String,
}

/// API error type that converts domain errors to HTTP responses
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error_type: ExceptionType,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ExceptionType, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type,
            message: message.into(),
        }
    }

    /// 400 VALIDATION with the given reason
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ExceptionType::Validation, message)
    }

    /// Create from AccountError
    pub fn from_account_error(err: AccountError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            // The client only sees "Internal error"; keep the detail in the log
            error!(error = %err, "Request failed");
        }

        Self {
            status,
            error_type: err.error_type(),
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error_type: self.error_type,
            msg: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        ApiError::from_account_error(err)
    }
}
