//! # Dreamstart Mail
//!
//! Transactional email for Dreamstart: a small catalogue of emails rendered
//! from Markdown templates, queued in-process, and delivered in the
//! background with exponential-backoff retries.
//!
//! ## Example
//!
//! ```no_run
//! use dreamstart_mail::{
//!     ConsoleMailer, Email, EmailAddresses, MailQueue, MailService, MailWorker, Renderer,
//!     RetryPolicy,
//! };
//!
//! # async fn example() -> Result<(), dreamstart_mail::MailError> {
//! let (queue, receiver) = MailQueue::new();
//! MailWorker::new(receiver, ConsoleMailer, RetryPolicy::default()).spawn();
//!
//! let mail = MailService::new(Renderer::new(true), queue, EmailAddresses::default());
//! mail.send(&Email::Welcome, "new-user@example.com", false)?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod catalogue;
pub mod config;
pub mod error;
pub mod mailer;
pub mod queue;
pub mod render;
pub mod retry;
pub mod service;

pub use catalogue::{Email, Sender};
pub use config::{EmailAddresses, MailConfig, SmtpConfig};
pub use error::{MailError, Result};
pub use mailer::{ConsoleMailer, Mailer, OutgoingMail, RecordingMailer, SmtpMailer};
pub use queue::{MailJob, MailQueue, MailReceiver, MailWorker, worker_enabled};
pub use render::{RenderedEmail, Renderer};
pub use retry::RetryPolicy;
pub use service::MailService;
