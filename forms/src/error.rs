//! Error types for schema construction and input validation.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single rule violation on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: String,

    /// Name of the violated rule (`required`, `email`, `minLength`, ...).
    pub rule: String,

    /// Human-readable message.
    pub message: String,

    /// Allowed values, for `enum` style rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

impl FieldError {
    /// Create a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
            choices: None,
        }
    }

    /// Attach the list of allowed values.
    #[must_use]
    pub fn with_choices(mut self, choices: Vec<String>) -> Self {
        self.choices = Some(choices);
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.field, self.rule, self.message)
    }
}

/// Validation failure for a submitted payload.
///
/// Always carries at least one [`FieldError`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub struct ValidationError {
    /// Every violation found, in schema declaration order.
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Create an error from a non-empty list of violations.
    #[must_use]
    pub const fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Create an error holding a single violation.
    #[must_use]
    pub fn single(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Returns the violation reported for `field`, if any.
    #[must_use]
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    /// Returns `true` if `field` has a violation.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.for_field(field).is_some()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed")?;
        for (i, error) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{error}")?;
        }
        Ok(())
    }
}

/// Errors raised while building an intent validator.
///
/// These are programming errors and surface at startup, never per request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The same intent literal was registered more than once.
    #[error("Intent `{0}` is registered more than once")]
    DuplicateIntent(String),

    /// No intents were registered.
    #[error("An intent validator needs at least one intent")]
    NoIntents,

    /// An intent literal was empty.
    #[error("Intent names must not be empty")]
    EmptyIntent,
}
