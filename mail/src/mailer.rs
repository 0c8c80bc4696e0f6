//! Delivery transports.

use crate::config::SmtpConfig;
use crate::error::{MailError, Result};
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Blind copy, if any.
    pub bcc: Option<String>,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

impl OutgoingMail {
    /// Assemble a `lettre` message.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::InvalidAddress`] or [`MailError::Build`].
    pub fn to_message(&self) -> Result<Message> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&self.from)?)
            .to(parse_mailbox(&self.to)?)
            .subject(self.subject.clone())
            .header(ContentType::TEXT_HTML);

        if let Some(bcc) = &self.bcc {
            builder = builder.bcc(parse_mailbox(bcc)?);
        }

        builder
            .body(self.html.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| MailError::InvalidAddress(format!("{address}: {e}")))
}

/// Email transport.
///
/// Implementations deliver one message; retries are the caller's concern.
pub trait Mailer: Send + Sync + 'static {
    /// Deliver `mail`.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::Transport`] for delivery failures and
    /// [`MailError::InvalidAddress`] / [`MailError::Build`] for malformed mail.
    fn deliver(&self, mail: &OutgoingMail) -> impl Future<Output = Result<()>> + Send;
}

/// SMTP transport using `lettre`.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    /// Build a transport for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::Transport`] if the relay cannot be configured.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let builder = if config.tls {
            SmtpTransport::relay(&config.host)
                .map_err(|e| MailError::Transport(format!("SMTP relay error: {e}")))?
        } else {
            SmtpTransport::builder_dangerous(&config.host)
        };

        let builder = builder.port(config.port);
        let builder = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => builder.credentials(Credentials::new(user.clone(), pass.clone())),
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
        })
    }
}

impl Mailer for SmtpMailer {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
        let message = mail.to_message()?;
        let transport = self.transport.clone();

        tokio::task::spawn_blocking(move || {
            transport
                .send(&message)
                .map_err(|e| MailError::Transport(e.to_string()))
        })
        .await
        .map_err(|e| MailError::Transport(format!("Email task failed: {e}")))?
        .map(|_| ())
    }
}

/// Logs every message instead of sending it. Used in development.
#[derive(Debug, Clone, Default)]
pub struct ConsoleMailer;

impl Mailer for ConsoleMailer {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
        mail.to_message()?;

        tracing::info!(
            from = %mail.from,
            to = %mail.to,
            bcc = ?mail.bcc,
            subject = %mail.subject,
            "📧 Email (console mailer)"
        );
        tracing::debug!(html = %mail.html, "Email body");

        Ok(())
    }
}

/// In-memory mailer that records deliveries, optionally failing the first
/// few attempts.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
    failures_left: Arc<Mutex<usize>>,
}

impl RecordingMailer {
    /// Create a mailer that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mailer whose first `n` deliveries fail with a transport error.
    #[must_use]
    pub fn failing(n: usize) -> Self {
        Self {
            sent: Arc::default(),
            failures_left: Arc::new(Mutex::new(n)),
        }
    }

    /// Messages delivered so far.
    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Messages delivered to `to`.
    #[must_use]
    pub fn sent_to(&self, to: &str) -> Vec<OutgoingMail> {
        self.sent().into_iter().filter(|m| m.to == to).collect()
    }
}

impl Mailer for RecordingMailer {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
        mail.to_message()?;

        {
            let mut left = self
                .failures_left
                .lock()
                .map_err(|_| MailError::Transport("Mutex lock failed".into()))?;
            if *left > 0 {
                *left -= 1;
                return Err(MailError::Transport("simulated failure".into()));
            }
        }

        self.sent
            .lock()
            .map_err(|_| MailError::Transport("Mutex lock failed".into()))?
            .push(mail.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mail() -> OutgoingMail {
        OutgoingMail {
            from: "Robot <robot@example.com>".into(),
            to: "user@example.com".into(),
            bcc: Some("owner@example.com".into()),
            subject: "Hi".into(),
            html: "<p>Hi</p>".into(),
        }
    }

    #[test]
    fn test_to_message_includes_bcc() {
        let message = mail().to_message().unwrap();
        let headers = message.headers().to_string();
        assert!(headers.contains("Subject: Hi"));
        assert!(headers.contains("To: user@example.com"));
    }

    #[test]
    fn test_invalid_recipient() {
        let mut bad = mail();
        bad.to = "not an address".into();
        assert!(matches!(bad.to_message(), Err(MailError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_recording_mailer_fails_then_records() {
        let mailer = RecordingMailer::failing(1);
        assert!(mailer.deliver(&mail()).await.is_err());
        mailer.deliver(&mail()).await.unwrap();
        assert_eq!(mailer.sent_to("user@example.com").len(), 1);
    }

    #[tokio::test]
    async fn test_console_mailer_rejects_malformed_mail() {
        let mut bad = mail();
        bad.from = "nope".into();
        assert!(ConsoleMailer.deliver(&bad).await.is_err());
        assert!(ConsoleMailer.deliver(&mail()).await.is_ok());
    }
}
