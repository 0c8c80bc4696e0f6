//! Field rules and their fluent builders.
//!
//! ```
//! use dreamstart_forms::rules::{boolean, number, one_of, string};
//!
//! let email = string().email();
//! let password = string().min_length(6);
//! let age = number().min(18.0);
//! let active = boolean().optional();
//! let theme = one_of(["dark", "app", "system"]);
//! # let _ = (email, password, age, active, theme);
//! ```
//!
//! Values coming from HTML forms are always strings, so `number` and
//! `boolean` accept their textual spellings and emit typed JSON values.

use crate::error::FieldError;
use serde_json::{Number, Value};

/// A validation rule bound to one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    kind: FieldKind,
    optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum FieldKind {
    String(StringField),
    Number(NumberField),
    Boolean,
    Enum(Vec<String>),
}

impl Field {
    /// Returns `true` if the field may be omitted.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Validate one field value.
    ///
    /// Returns `Ok(None)` for an omitted optional field and `Ok(Some(value))`
    /// with the normalized value otherwise. Only the first violated rule is
    /// reported.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] naming `name` and the violated rule.
    pub fn check(&self, name: &str, value: Option<&Value>) -> Result<Option<Value>, FieldError> {
        let value = match value {
            None | Some(Value::Null) => {
                if self.optional {
                    return Ok(None);
                }
                return Err(FieldError::new(
                    name,
                    "required",
                    format!("The {name} field must be defined"),
                ));
            }
            Some(value) => value,
        };

        match &self.kind {
            FieldKind::String(rules) => rules.check(name, value),
            FieldKind::Number(rules) => rules.check(name, value),
            FieldKind::Boolean => check_boolean(name, value),
            FieldKind::Enum(choices) => check_enum(name, value, choices),
        }
        .map(Some)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Strings
// ═══════════════════════════════════════════════════════════════════════

/// Start a string rule.
#[must_use]
pub const fn string() -> StringField {
    StringField {
        email: false,
        min_length: None,
        max_length: None,
    }
}

/// Builder for string fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringField {
    email: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl StringField {
    /// Require a syntactically valid email address.
    #[must_use]
    pub const fn email(mut self) -> Self {
        self.email = true;
        self
    }

    /// Require at least `n` characters.
    #[must_use]
    pub const fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    /// Allow at most `n` characters.
    #[must_use]
    pub const fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    /// Allow the field to be omitted.
    #[must_use]
    pub fn optional(self) -> Field {
        Field {
            kind: FieldKind::String(self),
            optional: true,
        }
    }

    fn check(&self, name: &str, value: &Value) -> Result<Value, FieldError> {
        let Value::String(s) = value else {
            return Err(FieldError::new(
                name,
                "string",
                format!("The {name} field must be a string"),
            ));
        };

        if self.email && !is_email(s) {
            return Err(FieldError::new(
                name,
                "email",
                format!("The {name} field must be a valid email address"),
            ));
        }

        let len = s.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                return Err(FieldError::new(
                    name,
                    "minLength",
                    format!("The {name} field must have at least {min} characters"),
                ));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(FieldError::new(
                    name,
                    "maxLength",
                    format!("The {name} field must not be greater than {max} characters"),
                ));
            }
        }

        Ok(value.clone())
    }
}

impl From<StringField> for Field {
    fn from(rules: StringField) -> Self {
        Self {
            kind: FieldKind::String(rules),
            optional: false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Numbers
// ═══════════════════════════════════════════════════════════════════════

/// Start a number rule.
#[must_use]
pub const fn number() -> NumberField {
    NumberField {
        min: None,
        max: None,
    }
}

/// Builder for number fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberField {
    min: Option<f64>,
    max: Option<f64>,
}

impl NumberField {
    /// Require a value of at least `min` (inclusive).
    #[must_use]
    pub const fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Require a value of at most `max` (inclusive).
    #[must_use]
    pub const fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Allow the field to be omitted.
    #[must_use]
    pub fn optional(self) -> Field {
        Field {
            kind: FieldKind::Number(self),
            optional: true,
        }
    }

    fn check(&self, name: &str, value: &Value) -> Result<Value, FieldError> {
        let not_a_number =
            || FieldError::new(name, "number", format!("The {name} field must be a number"));

        let (number, as_f64) = match value {
            Value::Number(n) => {
                let f = n.as_f64().ok_or_else(not_a_number)?;
                (n.clone(), f)
            }
            Value::String(s) => parse_number(s.trim()).ok_or_else(not_a_number)?,
            _ => return Err(not_a_number()),
        };

        if let Some(min) = self.min {
            if as_f64 < min {
                return Err(FieldError::new(
                    name,
                    "min",
                    format!("The {name} field must be at least {min}"),
                ));
            }
        }
        if let Some(max) = self.max {
            if as_f64 > max {
                return Err(FieldError::new(
                    name,
                    "max",
                    format!("The {name} field must not be greater than {max}"),
                ));
            }
        }

        Ok(Value::Number(number))
    }
}

impl From<NumberField> for Field {
    fn from(rules: NumberField) -> Self {
        Self {
            kind: FieldKind::Number(rules),
            optional: false,
        }
    }
}

/// Parse a form-encoded number, keeping integers integral.
fn parse_number(s: &str) -> Option<(Number, f64)> {
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        #[allow(clippy::cast_precision_loss)]
        return Some((Number::from(i), i as f64));
    }
    let f = s.parse::<f64>().ok()?;
    Number::from_f64(f).map(|n| (n, f))
}

// ═══════════════════════════════════════════════════════════════════════
// Booleans
// ═══════════════════════════════════════════════════════════════════════

/// Start a boolean rule.
#[must_use]
pub const fn boolean() -> BooleanField {
    BooleanField
}

/// Builder for boolean fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooleanField;

impl BooleanField {
    /// Allow the field to be omitted.
    #[must_use]
    pub const fn optional(self) -> Field {
        Field {
            kind: FieldKind::Boolean,
            optional: true,
        }
    }
}

impl From<BooleanField> for Field {
    fn from(_: BooleanField) -> Self {
        Self {
            kind: FieldKind::Boolean,
            optional: false,
        }
    }
}

fn check_boolean(name: &str, value: &Value) -> Result<Value, FieldError> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "true" | "1" | "on" => Some(true),
            "false" | "0" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    };

    parsed.map(Value::Bool).ok_or_else(|| {
        FieldError::new(name, "boolean", format!("The {name} field must be a boolean"))
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Enums
// ═══════════════════════════════════════════════════════════════════════

/// Start a rule accepting one of a fixed set of strings.
#[must_use]
pub fn one_of<I, S>(choices: I) -> EnumField
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    EnumField {
        choices: choices.into_iter().map(Into::into).collect(),
    }
}

/// Builder for enum fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumField {
    choices: Vec<String>,
}

impl EnumField {
    /// Allow the field to be omitted.
    #[must_use]
    pub fn optional(self) -> Field {
        Field {
            kind: FieldKind::Enum(self.choices),
            optional: true,
        }
    }
}

impl From<EnumField> for Field {
    fn from(rules: EnumField) -> Self {
        Self {
            kind: FieldKind::Enum(rules.choices),
            optional: false,
        }
    }
}

fn check_enum(name: &str, value: &Value, choices: &[String]) -> Result<Value, FieldError> {
    match value {
        Value::String(s) if choices.iter().any(|c| c == s) => Ok(value.clone()),
        _ => Err(FieldError::new(
            name,
            "enum",
            format!(
                "The selected {name} is invalid. Allowed values: {}",
                choices.join(", ")
            ),
        )
        .with_choices(choices.to_vec())),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Email syntax
// ═══════════════════════════════════════════════════════════════════════

/// Validate email address format.
///
/// Basic RFC 5322 shape:
/// - exactly one `@` with non-empty local and domain parts
/// - a dotted domain with no empty labels
/// - 3 to 255 characters overall
///
/// ```
/// use dreamstart_forms::rules::is_email;
///
/// assert!(is_email("user@example.com"));
/// assert!(is_email("user+tag@subdomain.example.com"));
/// assert!(!is_email("not-an-email"));
/// assert!(!is_email("user@"));
/// ```
#[must_use]
pub fn is_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    if !domain.contains('.') {
        return false;
    }

    let valid_local = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    local.chars().all(valid_local)
        && domain.chars().all(valid_domain)
        && domain.split('.').all(|label| !label.is_empty())
}
