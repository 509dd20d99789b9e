// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Mutation target is missing or belongs to someone else. The two cases
    /// are reported identically so callers cannot probe for existence.
    #[error("{0}")]
    NotFoundOrForbidden(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage fault surfaced to callers by operation name only.
    #[error("{0}")]
    OperationFailed(&'static str),

    #[error("Maps API error: {0}")]
    MapsApi(String),

    #[error("Maps API is not configured")]
    MapsUnavailable,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub const TRIP_MODIFY_DENIED: &'static str =
        "Trip not found or you don't have permission to modify it";
    pub const TRIP_DELETE_DENIED: &'static str =
        "Trip not found or you don't have permission to delete it";

    /// Log a storage fault with its operation context and replace it with the
    /// generic operation-named failure. Errors that already carry a meaning for
    /// the caller pass through untouched.
    pub fn storage_fault(self, operation: &'static str) -> Self {
        match self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, operation, "Storage fault");
                AppError::OperationFailed(operation)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, operation, "Unexpected failure");
                AppError::OperationFailed(operation)
            }
            other => other,
        }
    }

    /// Build a `map_err` adapter for [`AppError::storage_fault`].
    pub fn during(operation: &'static str) -> impl FnOnce(AppError) -> AppError {
        move |err| err.storage_fault(operation)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                Some(self.to_string()),
            ),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                Some(self.to_string()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::NotFoundOrForbidden(msg) => (
                StatusCode::NOT_FOUND,
                "not_found_or_forbidden",
                Some(msg.clone()),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::OperationFailed(op) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "operation_failed",
                Some(op.to_string()),
            ),
            AppError::MapsApi(msg) => (StatusCode::BAD_GATEWAY, "maps_error", Some(msg.clone())),
            AppError::MapsUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "maps_unavailable",
                Some(self.to_string()),
            ),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
