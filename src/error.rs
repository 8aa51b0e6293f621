//! Error types for verigate.

use thiserror::Error;

use crate::auth::PasswordError;

/// Common error type for verigate.
#[derive(Error, Debug)]
pub enum VerigateError {
    /// Database error.
    ///
    /// Wraps errors from any database backend. Errors from sqlx are converted
    /// automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// No valid session, or credentials rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Valid session but the role is not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Verification token has expired (or was superseded).
    #[error("verification token has expired")]
    TokenExpired,

    /// Verification token was already consumed.
    #[error("verification token has already been used")]
    TokenAlreadyUsed,

    /// Too many requests; retry later.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until another attempt may succeed.
        retry_after_secs: u64,
    },

    /// Outbound mail delivery failed.
    #[error("mail error: {0}")]
    Mail(String),

    /// Password hashing or verification failure.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for VerigateError {
    fn from(e: sqlx::Error) -> Self {
        VerigateError::Database(e.to_string())
    }
}

/// Result type alias for verigate operations.
pub type Result<T> = std::result::Result<T, VerigateError>;
