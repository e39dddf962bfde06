//! Error types for birdtag-ingest

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// birdtag-common error
    #[error(transparent)]
    Common(#[from] birdtag_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use birdtag_common::Error;

        let (status, error, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(msg),
            ),
            ApiError::Common(err) => match err {
                Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
                Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg, None),
                Error::Unsupported(msg) => (
                    StatusCode::BAD_REQUEST,
                    format!("Unsupported media type: {}", msg),
                    None,
                ),
                other => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(other.to_string()),
                ),
            },
        };

        let body = match details {
            Some(details) => Json(json!({ "error": error, "details": details })),
            None => Json(json!({ "error": error })),
        };

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
