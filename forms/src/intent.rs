//! Intent-multiplexed validation.
//!
//! One endpoint often hosts several logical forms. Each submission carries a
//! hidden `intent` field naming the form; the [`IntentValidator`] checks that
//! the intent is registered and then applies only that intent's schema.
//!
//! ```
//! use dreamstart_forms::{IntentValidator, Schema, rules::{boolean, one_of}};
//! use serde_json::json;
//!
//! let validator = IntentValidator::builder()
//!     .intent("change-theme", Schema::new().field("theme", one_of(["dark", "app", "system"])))
//!     .intent("set-prefer-dark-mode", Schema::new().field("prefersDarkMode", boolean()))
//!     .build()?;
//!
//! let input = json!({ "intent": "change-theme", "theme": "dark" });
//! let submission = validator.validate(input.as_object().unwrap_or(&Default::default()))?;
//! assert_eq!(submission.intent(), "change-theme");
//! assert_eq!(submission.str_field("theme"), Some("dark"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{FieldError, SchemaError, ValidationError};
use crate::schema::Schema;
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Name of the discriminating field.
pub const INTENT_FIELD: &str = "intent";

/// Validator dispatching on the `intent` field.
///
/// Immutable once built; share it freely between requests.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentValidator {
    intents: Vec<(String, Schema)>,
}

impl IntentValidator {
    /// Start building a validator.
    #[must_use]
    pub const fn builder() -> IntentValidatorBuilder {
        IntentValidatorBuilder {
            intents: Vec::new(),
        }
    }

    /// Build a validator from `(intent, schema)` pairs.
    ///
    /// # Errors
    ///
    /// See [`IntentValidatorBuilder::build`].
    pub fn new<I, K>(intents: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        intents
            .into_iter()
            .fold(Self::builder(), |b, (k, s)| b.intent(k, s))
            .build()
    }

    /// Registered intent names, in registration order.
    pub fn intents(&self) -> impl Iterator<Item = &str> {
        self.intents.iter().map(|(name, _)| name.as_str())
    }

    /// Schema registered for `intent`.
    #[must_use]
    pub fn schema(&self, intent: &str) -> Option<&Schema> {
        self.intents
            .iter()
            .find(|(name, _)| name == intent)
            .map(|(_, schema)| schema)
    }

    /// Validate a raw payload.
    ///
    /// # Errors
    ///
    /// - `intent` missing → violation on `intent` with rule `required`
    /// - `intent` not registered → violation on `intent` with rule `enum`
    /// - any field of the matched intent failing its rule
    pub fn validate(&self, input: &Map<String, Value>) -> Result<Submission, ValidationError> {
        let (intent, schema) = self.match_intent(input.get(INTENT_FIELD))?;

        let fields = schema.validate(input)?;
        Ok(Submission {
            intent: intent.to_string(),
            fields,
        })
    }

    /// Validate any JSON value; non-objects fail on the `intent` field.
    ///
    /// # Errors
    ///
    /// Same as [`IntentValidator::validate`].
    pub fn validate_value(&self, input: &Value) -> Result<Submission, ValidationError> {
        match input {
            Value::Object(map) => self.validate(map),
            _ => self.validate(&Map::new()),
        }
    }

    /// Validate and deserialize into a `#[serde(tag = "intent")]` enum.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Invalid`] for rule violations and
    /// [`FormError::Shape`] if the validated payload does not fit `T`.
    pub fn parse<T: DeserializeOwned>(&self, input: &Map<String, Value>) -> Result<T, FormError> {
        let submission = self.validate(input)?;
        submission.into_typed().map_err(FormError::Shape)
    }

    fn match_intent(&self, value: Option<&Value>) -> Result<(&str, &Schema), ValidationError> {
        let requested = match value {
            None | Some(Value::Null) => {
                let problem = format!("The {INTENT_FIELD} field must be defined");
                return Err(self.intent_error("required", &problem));
            }
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => None,
        };

        requested
            .and_then(|r| self.intents.iter().find(|(name, _)| name == r))
            .map(|(name, schema)| (name.as_str(), schema))
            .ok_or_else(|| {
                let problem = format!("The selected {INTENT_FIELD} is invalid");
                self.intent_error("enum", &problem)
            })
    }

    fn intent_error(&self, rule: &str, problem: &str) -> ValidationError {
        let allowed: Vec<String> = self.intents().map(str::to_string).collect();
        let message = format!("{problem}. Allowed values: {}", allowed.join(", "));
        ValidationError::single(FieldError::new(INTENT_FIELD, rule, message).with_choices(allowed))
    }
}

/// Builder for [`IntentValidator`].
#[derive(Debug, Clone, Default)]
pub struct IntentValidatorBuilder {
    intents: Vec<(String, Schema)>,
}

impl IntentValidatorBuilder {
    /// Register an intent and its field schema.
    #[must_use]
    pub fn intent(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.intents.push((name.into(), schema));
        self
    }

    /// Finish building.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::NoIntents`] if nothing was registered
    /// - [`SchemaError::EmptyIntent`] if an intent name is empty
    /// - [`SchemaError::DuplicateIntent`] if a name was registered twice
    pub fn build(self) -> Result<IntentValidator, SchemaError> {
        if self.intents.is_empty() {
            return Err(SchemaError::NoIntents);
        }
        for (i, (name, _)) in self.intents.iter().enumerate() {
            if name.is_empty() {
                return Err(SchemaError::EmptyIntent);
            }
            if self.intents[..i].iter().any(|(earlier, _)| earlier == name) {
                return Err(SchemaError::DuplicateIntent(name.clone()));
            }
        }
        Ok(IntentValidator {
            intents: self.intents,
        })
    }
}

/// A validated payload: the matched intent plus that intent's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    intent: String,
    fields: Map<String, Value>,
}

impl Submission {
    /// The matched intent literal.
    #[must_use]
    pub fn intent(&self) -> &str {
        &self.intent
    }

    /// Validated fields (without `intent`).
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Raw value of a validated field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String value of a validated field.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Boolean value of a validated field.
    #[must_use]
    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Numeric value of a validated field.
    #[must_use]
    pub fn number_field(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// The full payload as a JSON object: `{ intent, ...fields }`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert(INTENT_FIELD.to_string(), Value::String(self.intent.clone()));
        Value::Object(map)
    }

    /// Deserialize into a typed representation, typically an enum tagged
    /// with `#[serde(tag = "intent")]`.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the payload does not fit `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}

impl Serialize for Submission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(INTENT_FIELD, &self.intent)?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Failure of [`IntentValidator::parse`].
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// The payload violated a rule.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The validated payload did not match the target type.
    #[error("Validated form does not match its target type: {0}")]
    Shape(serde_json::Error),
}
