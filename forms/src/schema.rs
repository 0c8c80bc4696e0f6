//! Object schemas: an ordered set of named field rules.

use crate::error::{FieldError, ValidationError};
use crate::rules::Field;
use serde_json::{Map, Value};

/// An ordered mapping from field name to [`Field`] rule.
///
/// Declaring the same name twice replaces the earlier rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<(String, Field)>,
}

impl Schema {
    /// Create an empty schema.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add (or replace) a field rule.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rule: impl Into<Field>) -> Self {
        let name = name.into();
        let rule = rule.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = rule;
        } else {
            self.fields.push((name, rule));
        }
        self
    }

    /// Returns `true` if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Declared field names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Validate `input` against every declared field.
    ///
    /// Undeclared keys are dropped from the output; they are never an error.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every field that failed.
    pub fn validate(&self, input: &Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        let mut output = Map::new();
        let mut errors: Vec<FieldError> = Vec::new();

        for (name, rule) in &self.fields {
            match rule.check(name, input.get(name)) {
                Ok(Some(value)) => {
                    output.insert(name.clone(), value);
                }
                Ok(None) => {}
                Err(error) => errors.push(error),
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(ValidationError::new(errors))
        }
    }
}
