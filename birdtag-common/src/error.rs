//! Common error types for BirdTag services

use thiserror::Error;

/// Common result type for BirdTag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across BirdTag microservices
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File could not be classified as image, video, or audio
    #[error("Unsupported media type: {0}")]
    Unsupported(String),

    /// Call to an external dependency (detector, blob store) failed
    #[error("Dependency failure: {0}")]
    Dependency(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
