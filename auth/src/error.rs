//! Error types for authentication operations.

use crate::signed_url::SignatureError;
use dreamstart_mail::MailError;
use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for users, sessions, and login links.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Input Errors
    // ═══════════════════════════════════════════════════════════

    /// Email address is malformed or from a disposable provider.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// A signed URL failed verification.
    #[error(transparent)]
    InvalidSignature(#[from] SignatureError),

    /// A user with this email already exists.
    #[error("Email already exists")]
    EmailAlreadyExists,

    /// Requested resource not found.
    #[error("Resource not found")]
    ResourceNotFound,

    // ═══════════════════════════════════════════════════════════
    // Session Errors
    // ═══════════════════════════════════════════════════════════

    /// Session has expired.
    #[error("Session has expired")]
    SessionExpired,

    /// Session not found.
    #[error("Session not found")]
    SessionNotFound,

    // ═══════════════════════════════════════════════════════════
    // Rate Limiting
    // ═══════════════════════════════════════════════════════════

    /// Too many attempts within the window.
    #[error("Too many attempts, please retry after {retry_after:?}")]
    TooManyAttempts {
        /// Duration to wait before retrying
        retry_after: std::time::Duration,
    },

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Session serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Email could not be queued.
    #[error(transparent)]
    Mail(#[from] MailError),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Returns `true` if this error is due to invalid user input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dreamstart_auth::AuthError;
    /// assert!(AuthError::InvalidEmail("x".into()).is_user_error());
    /// assert!(!AuthError::InternalError("boom".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail(_)
                | Self::InvalidSignature(_)
                | Self::EmailAlreadyExists
                | Self::TooManyAttempts { .. }
        )
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(error: redis::RedisError) -> Self {
        Self::InternalError(format!("Redis error: {error}"))
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerializationError(error.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for AuthError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &error {
            if db_err.is_unique_violation() {
                return Self::EmailAlreadyExists;
            }
        }
        Self::DatabaseError(error.to_string())
    }
}
