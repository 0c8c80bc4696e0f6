//! Error types for web handlers.
//!
//! This module defines error types that bridge between domain errors
//! and HTTP responses, implementing Axum's `IntoResponse` trait.
//!
//! Only user-facing failures keep their message. Everything else is
//! answered with a generic 500 while the detail goes to the logs and to the
//! persisted error log (see [`ErrorRecord`]).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dreamstart_auth::AuthError;
use dreamstart_forms::{FieldError, FormError, ValidationError};
use dreamstart_mail::MailError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Message sent to clients for unexpected failures.
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred";

/// An error whose status and message are safe to show to the user.
///
/// Wrap it in `anyhow::Error` or convert it into [`AppError`]; either way the
/// status and message reach the client unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UserFacingError {
    /// HTTP status to answer with.
    pub status: StatusCode,
    /// Message shown to the user.
    pub message: String,
}

impl UserFacingError {
    /// Create a user-facing error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Data>, AppError> {
///     let user = find_user(id).await
///         .map_err(|e| AppError::not_found("User", id))?;
///     Ok(Json(user))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Per-field violations, for validation failures
    errors: Option<Vec<FieldError>>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            errors: None,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            message.into(),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), "CONFLICT".to_string())
    }

    /// Create a 422 error listing every invalid field.
    #[must_use]
    pub fn validation(error: ValidationError) -> Self {
        let mut err = Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Validation failed".to_string(),
            "VALIDATION_ERROR".to_string(),
        );
        err.errors = Some(error.errors);
        err
    }

    /// Create a 429 Too Many Requests error.
    #[must_use]
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            message.into(),
            "TOO_MANY_REQUESTS".to_string(),
        )
    }

    /// Create a 500 error for an unexpected failure.
    ///
    /// The client sees [`UNEXPECTED_MESSAGE`]; `source` is logged.
    #[must_use]
    pub fn unexpected(source: impl Into<anyhow::Error>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            UNEXPECTED_MESSAGE.to_string(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
        .with_source(source.into())
    }

    /// Create a 500 error from an internal message.
    #[must_use]
    pub fn internal(message: impl fmt::Display) -> Self {
        Self::unexpected(anyhow::anyhow!("{message}"))
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Field violations, if this is a validation error.
    #[must_use]
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        self.errors.as_deref()
    }

    fn record(&self) -> ErrorRecord {
        match &self.source {
            Some(source) => ErrorRecord {
                name: self.code.clone(),
                message: source.to_string(),
                stack: Some(format!("{source:?}")),
                user_id: None,
            },
            None => ErrorRecord {
                name: self.code.clone(),
                message: self.message.clone(),
                stack: None,
                user_id: None,
            },
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Details of a server error, attached to the response for the
/// error-logging middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Error name (the `AppError` code).
    pub name: String,
    /// Internal message.
    pub message: String,
    /// Source chain, if any.
    pub stack: Option<String>,
    /// Authenticated user, filled in by the auth middleware.
    pub user_id: Option<String>,
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
    /// Field violations.
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let record = self.status.is_server_error().then(|| {
            let record = self.record();
            tracing::error!(
                status = %self.status,
                code = %self.code,
                error = %record.message,
                "Internal server error"
            );
            record
        });

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            errors: self.errors,
        };

        let mut response = (self.status, Json(body)).into_response();
        if let Some(record) = record {
            response.extensions_mut().insert(record);
        }
        response
    }
}

impl From<UserFacingError> for AppError {
    fn from(err: UserFacingError) -> Self {
        let code = err
            .status
            .canonical_reason()
            .map_or_else(|| "ERROR".to_string(), |r| r.to_uppercase().replace(' ', "_"));
        Self::new(err.status, err.message, code)
    }
}

/// Convert `anyhow::Error` to `AppError`.
///
/// A wrapped [`UserFacingError`] keeps its status and message.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<UserFacingError>() {
            Ok(user_facing) => user_facing.into(),
            Err(err) => Self::unexpected(err),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err)
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Invalid(validation) => Self::validation(validation),
            FormError::Shape(e) => Self::bad_request(format!("Malformed form data: {e}")),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(message) => Self::bad_request(message),
            AuthError::InvalidSignature(e) => Self::unauthorized(e.to_string()),
            AuthError::EmailAlreadyExists => Self::conflict("Email already exists"),
            AuthError::ResourceNotFound => Self::not_found("Resource not found"),
            AuthError::SessionExpired | AuthError::SessionNotFound => {
                Self::unauthorized("Authentication required")
            }
            AuthError::TooManyAttempts { .. } => {
                Self::too_many_requests("Too many attempts. Please try again later.")
            }
            other => Self::unexpected(other),
        }
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        Self::unexpected(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dreamstart_auth::SignatureError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let err = AppError::from(ValidationError::single(FieldError::new(
            "email",
            "email",
            "The email field must be a valid email address",
        )));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(err.into_response()).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"][0]["field"], "email");
        assert_eq!(body["errors"][0]["rule"], "email");
    }

    #[tokio::test]
    async fn test_unexpected_hides_detail_and_records_it() {
        let err = AppError::from(anyhow::anyhow!("connection refused"));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let record = response.extensions().get::<ErrorRecord>().cloned().unwrap();
        assert_eq!(record.message, "connection refused");

        let body = body_json(response).await;
        assert_eq!(body["message"], UNEXPECTED_MESSAGE);
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_user_facing_keeps_status_and_message() {
        let err = AppError::from(anyhow::Error::new(UserFacingError::new(
            StatusCode::PAYMENT_REQUIRED,
            "Upgrade your plan",
        )));
        assert_eq!(err.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(err.message(), "Upgrade your plan");
        assert_eq!(err.code(), "PAYMENT_REQUIRED");
    }

    #[test]
    fn test_client_errors_carry_no_record() {
        let response = AppError::unauthorized("nope").into_response();
        assert!(response.extensions().get::<ErrorRecord>().is_none());
    }

    #[test]
    fn test_auth_error_mapping() {
        let err = AppError::from(AuthError::InvalidSignature(SignatureError::Invalid));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "The URL signature is invalid");

        let err = AppError::from(AuthError::DatabaseError("disk full".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), UNEXPECTED_MESSAGE);
    }
}
