//! Error types for email rendering and delivery.

use thiserror::Error;

/// Result type alias for mail operations.
pub type Result<T> = std::result::Result<T, MailError>;

/// Errors raised while rendering, queueing, or delivering email.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    /// The rendered template did not start with a `# Title` line.
    #[error("Email `{email}` must start with a level-one heading")]
    MissingTitle {
        /// Catalogue name of the email.
        email: &'static str,
    },

    /// Template rendering failed.
    #[error("Failed to render email template: {0}")]
    Render(String),

    /// A sender or recipient address could not be parsed.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The message could not be assembled.
    #[error("Failed to build email: {0}")]
    Build(String),

    /// The transport rejected or failed to deliver the message.
    #[error("Failed to send email: {0}")]
    Transport(String),

    /// The delivery queue has no worker left to receive jobs.
    #[error("Mail queue is closed")]
    QueueClosed,
}

impl MailError {
    /// Returns `true` if retrying delivery may succeed.
    ///
    /// ```
    /// # use dreamstart_mail::MailError;
    /// assert!(MailError::Transport("timeout".into()).is_transient());
    /// assert!(!MailError::InvalidAddress("nope".into()).is_transient());
    /// ```
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<askama::Error> for MailError {
    fn from(error: askama::Error) -> Self {
        Self::Render(error.to_string())
    }
}
