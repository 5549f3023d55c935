// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every failure is terminal for the request. Store and internal errors are
//! logged here and reach the client only as a generic `server_error`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Unknown username or wrong password. Deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("No session token provided")]
    NoToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Device verification required")]
    DeviceVerificationRequired,

    #[error("Account is already logged in on another device")]
    DeviceConflict,

    #[error("Access denied")]
    Forbidden,

    #[error("Access denied for this level")]
    LevelAccessDenied,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Store call timed out after {0} ms")]
    StoreTimeout(u64),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::AccountDisabled
            | AppError::NoToken
            | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::DeviceVerificationRequired
            | AppError::DeviceConflict
            | AppError::Forbidden
            | AppError::LevelAccessDenied => StatusCode::FORBIDDEN,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::StoreTimeout(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::AccountDisabled => "account_disabled",
            AppError::NoToken => "no_token",
            AppError::InvalidToken => "invalid_token",
            AppError::DeviceVerificationRequired => "device_verification_required",
            AppError::DeviceConflict => "device_conflict",
            AppError::Forbidden => "forbidden",
            AppError::LevelAccessDenied => "level_access_denied",
            AppError::Validation(_) => "validation_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::Database(_) | AppError::StoreTimeout(_) | AppError::Internal(_) => {
                "server_error"
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, details) = match &self {
            AppError::Validation(msg) => ("Validation failed".to_string(), Some(msg.clone())),
            AppError::BadRequest(msg) => ("Invalid request".to_string(), Some(msg.clone())),
            AppError::NotFound(msg) => ("Not found".to_string(), Some(msg.clone())),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("Server error".to_string(), None)
            }
            AppError::StoreTimeout(ms) => {
                tracing::error!(timeout_ms = ms, "Store call timed out");
                ("Server error".to_string(), None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("Server error".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        let body = ErrorResponse {
            error: self.code(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
