//! # Dreamstart Forms
//!
//! Declarative validation for form submissions that multiplex several
//! logical actions over one endpoint.
//!
//! Every submission carries an `intent` field naming the action. An
//! [`IntentValidator`] maps each intent to a [`Schema`] of field rules,
//! rejects unknown intents, and validates only the fields that belong to
//! the matched intent.
//!
//! ## Example
//!
//! ```
//! use dreamstart_forms::{IntentValidator, Schema, input, rules::string};
//!
//! let login = IntentValidator::builder()
//!     .intent("login", Schema::new().field("email", string().email()))
//!     .build()?;
//!
//! let body = input::from_urlencoded("intent=login&email=test%40example.com")?;
//! let submission = login.validate(&body)?;
//! assert_eq!(submission.str_field("email"), Some("test@example.com"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod error;
pub mod input;
pub mod intent;
pub mod rules;
pub mod schema;

pub use error::{FieldError, SchemaError, ValidationError};
pub use intent::{FormError, INTENT_FIELD, IntentValidator, IntentValidatorBuilder, Submission};
pub use rules::Field;
pub use schema::Schema;
