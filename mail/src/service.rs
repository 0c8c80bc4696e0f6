//! The application-facing mail service.

use crate::catalogue::Email;
use crate::config::EmailAddresses;
use crate::error::Result;
use crate::mailer::OutgoingMail;
use crate::queue::MailQueue;
use crate::render::{RenderedEmail, Renderer};
use std::sync::Arc;
use uuid::Uuid;

/// Renders catalogue emails and queues them for background delivery.
#[derive(Debug, Clone)]
pub struct MailService {
    renderer: Renderer,
    queue: MailQueue,
    addresses: Arc<EmailAddresses>,
}

impl MailService {
    /// Create a service that pushes onto `queue`.
    #[must_use]
    pub fn new(renderer: Renderer, queue: MailQueue, addresses: EmailAddresses) -> Self {
        Self {
            renderer,
            queue,
            addresses: Arc::new(addresses),
        }
    }

    /// Configured sender addresses.
    #[must_use]
    pub fn addresses(&self) -> &EmailAddresses {
        &self.addresses
    }

    /// Render `email` and queue it for `to`. With `bcc_owner`, the owner
    /// address receives a blind copy.
    ///
    /// # Errors
    ///
    /// Returns a render error, or [`MailError::QueueClosed`](crate::MailError::QueueClosed)
    /// if no worker is consuming the queue.
    pub fn send(&self, email: &Email, to: &str, bcc_owner: bool) -> Result<Uuid> {
        let rendered = self.renderer.render(email)?;

        let mail = OutgoingMail {
            from: email.sender().address(&self.addresses).to_string(),
            to: to.to_string(),
            bcc: bcc_owner.then(|| self.addresses.owner.clone()),
            subject: rendered.title,
            html: rendered.html,
        };

        let job_id = self.queue.push(mail)?;
        tracing::info!(email = email.name(), %job_id, "Email queued");
        Ok(job_id)
    }

    /// Render an email by name with its dummy data.
    ///
    /// Returns `Ok(None)` for an unknown name.
    ///
    /// # Errors
    ///
    /// Returns a render error.
    pub fn preview(&self, name: &str) -> Result<Option<RenderedEmail>> {
        Email::dummy(name)
            .map(|email| self.renderer.render(&email))
            .transpose()
    }

    /// Render every catalogue email once, failing on the first broken template.
    ///
    /// # Errors
    ///
    /// Returns the first render error.
    pub fn check_templates(&self) -> Result<()> {
        for name in Email::NAMES {
            self.preview(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::MailError;

    fn service() -> (MailService, crate::queue::MailReceiver) {
        let (queue, receiver) = MailQueue::new();
        let addresses = EmailAddresses {
            automation: "robot@example.com".into(),
            owner: "owner@example.com".into(),
            support: "help@example.com".into(),
        };
        (MailService::new(Renderer::new(false), queue, addresses), receiver)
    }

    #[test]
    fn test_send_queues_rendered_mail() {
        let (service, mut receiver) = service();
        service
            .send(&Email::EmailLogin { url: "https://x.test/l".into() }, "user@example.com", false)
            .unwrap();

        let job = receiver.try_next().unwrap();
        assert_eq!(job.mail.from, "robot@example.com");
        assert_eq!(job.mail.to, "user@example.com");
        assert_eq!(job.mail.bcc, None);
        assert_eq!(job.mail.subject, "Sign in to your account");
        assert!(job.mail.html.contains("https://x.test/l"));
    }

    #[test]
    fn test_bcc_owner() {
        let (service, mut receiver) = service();
        service.send(&Email::Welcome, "user@example.com", true).unwrap();
        let job = receiver.try_next().unwrap();
        assert_eq!(job.mail.bcc.as_deref(), Some("owner@example.com"));
        assert_eq!(job.mail.from, "owner@example.com");
    }

    #[test]
    fn test_send_without_worker() {
        let (service, receiver) = service();
        drop(receiver);
        assert_eq!(service.send(&Email::Welcome, "user@example.com", false), Err(MailError::QueueClosed));
    }

    #[test]
    fn test_preview_and_template_check() {
        let (service, _receiver) = service();
        assert!(service.preview("welcome").unwrap().is_some());
        assert!(service.preview("unknown").unwrap().is_none());
        service.check_templates().unwrap();
    }
}
