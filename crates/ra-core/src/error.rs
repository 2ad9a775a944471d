//! # AppError
//!
//! Centralized error handling for Rusty-Ads.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all ra-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Ad, Comment). Also returned when the
    /// resource exists but belongs to someone else.
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., malformed upload)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No logged-in user. Carries the path to come back to after login.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Logged in, but the request failed a CSRF check
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Resource already exists (e.g., duplicate username)
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for Rusty-Ads logic.
pub type Result<T> = std::result::Result<T, AppError>;
