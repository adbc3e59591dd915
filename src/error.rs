//! Error types for Baketsu.

use thiserror::Error;

use crate::billing::BillingError;

/// Common error type for Baketsu.
#[derive(Error, Debug)]
pub enum BaketsuError {
    /// Database error.
    ///
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The resource already exists or is in a state that forbids the operation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Cost calculation error.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for BaketsuError {
    fn from(e: sqlx::Error) -> Self {
        BaketsuError::Database(e.to_string())
    }
}

/// Result type alias for Baketsu operations.
pub type Result<T> = std::result::Result<T, BaketsuError>;
