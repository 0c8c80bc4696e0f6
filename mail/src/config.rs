//! Mail configuration.

use crate::retry::RetryPolicy;
use std::time::Duration;

/// Sender addresses for each [`Sender`](crate::Sender).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddresses {
    /// Address for automated mail (`EMAIL_AUTOMATION`).
    pub automation: String,
    /// Address of the product owner (`EMAIL_OWNER`), also used for BCC copies.
    pub owner: String,
    /// Support address (`EMAIL_SUPPORT`).
    pub support: String,
}

impl Default for EmailAddresses {
    fn default() -> Self {
        Self {
            automation: "no-reply@localhost".to_string(),
            owner: "owner@localhost".to_string(),
            support: "support@localhost".to_string(),
        }
    }
}

/// SMTP relay settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    /// Relay host.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Username, if the relay requires authentication.
    pub username: Option<String>,
    /// Password, if the relay requires authentication.
    pub password: Option<String>,
    /// Use implicit TLS / STARTTLS. Disable only for local catchers such as Mailpit.
    pub tls: bool,
}

impl SmtpConfig {
    /// Relay at `host:port` with TLS and no credentials.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
            tls: true,
        }
    }

    /// Set credentials.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Enable or disable TLS.
    #[must_use]
    pub const fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }
}

/// Delivery settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Sender addresses.
    pub addresses: EmailAddresses,
    /// SMTP relay; `None` logs emails to the console instead.
    pub smtp: Option<SmtpConfig>,
    /// Cache static emails after their first render.
    pub cache_static: bool,
    /// Delivery attempts after the first failure.
    pub max_retries: usize,
    /// Delay before the first retry.
    pub retry_delay: Duration,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            addresses: EmailAddresses::default(),
            smtp: None,
            cache_static: false,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl MailConfig {
    /// Retry policy for the delivery worker.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.max_retries)
            .initial_delay(self.retry_delay)
            .build()
    }
}
