//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use listings::{RemoteError, SyncError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The signed-in user may not touch this resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A remote collaborator could not be reached; retrying may succeed
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        if e.is_transient() {
            return ApiError::Unavailable(e.to_string());
        }

        match e {
            SyncError::MissingId => ApiError::BadRequest(e.to_string()),
            SyncError::UserNotFound(_) | SyncError::Remote(RemoteError::NotFound(_)) => {
                ApiError::NotFound(e.to_string())
            }
            other => {
                error!("Request failed: {}", other);
                ApiError::InternalServerError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
