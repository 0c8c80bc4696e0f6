//! Background delivery queue.
//!
//! [`MailQueue`] is the cheap, cloneable producer half handed to request
//! handlers. [`MailWorker`] owns the consumer half and delivers each job
//! through a [`Mailer`] with exponential backoff. Jobs that exhaust their
//! retries are rescued: logged with the full message and dropped.

use crate::error::{MailError, Result};
use crate::mailer::{Mailer, OutgoingMail};
use crate::retry::{RetryPolicy, retry_with_predicate};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

/// One queued delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailJob {
    /// Job id, for log correlation.
    pub id: Uuid,
    /// The message.
    pub mail: OutgoingMail,
    /// When the job was queued.
    pub queued_at: DateTime<Utc>,
}

/// Producer half of the delivery queue.
#[derive(Debug, Clone)]
pub struct MailQueue {
    sender: mpsc::UnboundedSender<MailJob>,
}

/// Consumer half of the delivery queue.
#[derive(Debug)]
pub struct MailReceiver {
    receiver: mpsc::UnboundedReceiver<MailJob>,
}

impl MailQueue {
    /// Create a queue and its receiver.
    #[must_use]
    pub fn new() -> (Self, MailReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, MailReceiver { receiver })
    }

    /// Queue `mail` for delivery. Never waits on the transport.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::QueueClosed`] if the receiver was dropped.
    pub fn push(&self, mail: OutgoingMail) -> Result<Uuid> {
        let job = MailJob {
            id: Uuid::new_v4(),
            mail,
            queued_at: Utc::now(),
        };
        let id = job.id;

        self.sender.send(job).map_err(|_| MailError::QueueClosed)?;

        tracing::debug!(job_id = %id, "Queued email");
        Ok(id)
    }
}

impl MailReceiver {
    /// Take the next job without waiting.
    pub fn try_next(&mut self) -> Option<MailJob> {
        self.receiver.try_recv().ok()
    }

    /// Number of jobs waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if no jobs are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Returns `true` if this process should consume the mail queue.
///
/// Only web and test processes run the worker, and never while executing a
/// release command (migrations and the like).
///
/// ```
/// use dreamstart_mail::worker_enabled;
///
/// assert!(worker_enabled("web", false));
/// assert!(worker_enabled("test", false));
/// assert!(!worker_enabled("web", true));
/// assert!(!worker_enabled("console", false));
/// ```
#[must_use]
pub fn worker_enabled(environment: &str, release_command: bool) -> bool {
    matches!(environment, "web" | "test") && !release_command
}

/// Drains the queue and delivers each job.
pub struct MailWorker<M: Mailer> {
    receiver: MailReceiver,
    mailer: M,
    policy: RetryPolicy,
}

impl<M: Mailer> MailWorker<M> {
    /// Create a worker.
    #[must_use]
    pub const fn new(receiver: MailReceiver, mailer: M, policy: RetryPolicy) -> Self {
        Self {
            receiver,
            mailer,
            policy,
        }
    }

    /// Process jobs until every [`MailQueue`] handle is dropped.
    pub async fn run(mut self) {
        tracing::info!("Mail worker started");

        while let Some(job) = self.receiver.receiver.recv().await {
            self.process(job).await;
        }

        tracing::info!("Mail worker stopped");
    }

    /// Spawn [`MailWorker::run`] on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Deliver one job, retrying transient failures.
    ///
    /// Returns `true` if the job was delivered.
    pub async fn process(&self, job: MailJob) -> bool {
        let span = tracing::info_span!("mail_job", job_id = %job.id, to = %job.mail.to);

        let result = retry_with_predicate(
            &self.policy,
            || self.mailer.deliver(&job.mail),
            MailError::is_transient,
        )
        .instrument(span)
        .await;

        match result {
            Ok(()) => {
                tracing::info!(subject = %job.mail.subject, "Email delivered");
                true
            }
            Err(error) => {
                self.rescue(&job, &error);
                false
            }
        }
    }

    #[allow(clippy::unused_self)]
    fn rescue(&self, job: &MailJob, error: &MailError) {
        tracing::error!(
            job_id = %job.id,
            from = %job.mail.from,
            to = %job.mail.to,
            subject = %job.mail.subject,
            queued_at = %job.queued_at,
            error = %error,
            "Email delivery failed permanently"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mailer::RecordingMailer;
    use std::time::Duration;

    fn mail(to: &str) -> OutgoingMail {
        OutgoingMail {
            from: "robot@example.com".into(),
            to: to.into(),
            bcc: None,
            subject: "Subject".into(),
            html: "<p>x</p>".into(),
        }
    }

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(max_retries)
            .initial_delay(Duration::from_millis(1))
            .build()
    }

    #[test]
    fn test_push_after_receiver_dropped() {
        let (queue, receiver) = MailQueue::new();
        drop(receiver);
        assert_eq!(queue.push(mail("a@b.co")), Err(MailError::QueueClosed));
    }

    #[test]
    fn test_push_and_drain() {
        let (queue, mut receiver) = MailQueue::new();
        queue.push(mail("a@b.co")).unwrap();
        assert_eq!(receiver.len(), 1);
        assert_eq!(receiver.try_next().unwrap().mail.to, "a@b.co");
        assert!(receiver.is_empty());
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let (_queue, receiver) = MailQueue::new();
        let mailer = RecordingMailer::failing(2);
        let worker = MailWorker::new(receiver, mailer.clone(), fast_policy(3));

        let job = MailJob {
            id: Uuid::new_v4(),
            mail: mail("a@b.co"),
            queued_at: Utc::now(),
        };
        assert!(worker.process(job).await);
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_job_is_rescued() {
        let (_queue, receiver) = MailQueue::new();
        let mailer = RecordingMailer::failing(10);
        let worker = MailWorker::new(receiver, mailer.clone(), fast_policy(1));

        let job = MailJob {
            id: Uuid::new_v4(),
            mail: mail("a@b.co"),
            queued_at: Utc::now(),
        };
        assert!(!worker.process(job).await);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_run_drains_until_queue_dropped() {
        let (queue, receiver) = MailQueue::new();
        let mailer = RecordingMailer::new();
        let handle = MailWorker::new(receiver, mailer.clone(), fast_policy(0)).spawn();

        queue.push(mail("a@b.co")).unwrap();
        queue.push(mail("c@d.co")).unwrap();
        drop(queue);

        handle.await.unwrap();
        assert_eq!(mailer.sent().len(), 2);
    }
}
