//! Application Error Types
//!
//! Centralized error handling with Axum integration.
//!
//! The four business kinds (`NotFound`, `Forbidden`, `Conflict`,
//! `Validation`) are expected outcomes and are surfaced to the caller as-is.
//! Everything else is an unexpected failure: it is logged and answered with
//! a generic body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Whether this error is one of the expected business outcomes.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_)
                | AppError::Forbidden(_)
                | AppError::Conflict(_)
                | AppError::Validation(_)
        )
    }

    fn status_and_code(&self) -> (StatusCode, u16) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, 10001),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, 10002),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, 10003),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, 10004),
            AppError::Conflict(_) => (StatusCode::CONFLICT, 10005),
            AppError::Internal(_) | AppError::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, 10000)
            }
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::Validation(msg)
            | AppError::Unauthorized(msg) => {
                tracing::warn!(status = status.as_u16(), "Request refused: {}", msg);
                msg.clone()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Internal server error".to_string()
            }
        };

        (status, Json(ErrorResponse { code, message })).into_response()
    }
}
