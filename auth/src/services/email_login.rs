//! Passwordless login links.
//!
//! A login link is a signed, time-limited URL to `/email-login` carrying the
//! address. Following it proves ownership of the mailbox.

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::providers::RateLimiter;
use crate::signed_url::UrlSigner;
use crate::utils::is_deliverable_email;
use dreamstart_mail::{Email, MailService};
use std::sync::Arc;

/// Path the login link points at.
pub const EMAIL_LOGIN_PATH: &str = "/email-login";

/// Validates login requests, rate-limits them, and mails login links.
#[derive(Clone)]
pub struct EmailLoginService<L> {
    limiter: L,
    signer: UrlSigner,
    mail: MailService,
    config: Arc<AuthConfig>,
}

impl<L: RateLimiter> EmailLoginService<L> {
    /// Create the service. Links are signed with `config.app_key` and rooted
    /// at `config.app_url`.
    #[must_use]
    pub fn new(limiter: L, mail: MailService, config: Arc<AuthConfig>) -> Self {
        let signer = UrlSigner::new(config.app_url.clone(), config.app_key.as_bytes());
        Self {
            limiter,
            signer,
            mail,
            config,
        }
    }

    /// The signer used for login links.
    #[must_use]
    pub const fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Returns `true` if `email` is well formed and not a throwaway address.
    #[must_use]
    pub fn is_valid(&self, email: &str) -> bool {
        is_deliverable_email(email, &self.config.blocked_domains)
    }

    /// Record a login attempt from `ip`.
    ///
    /// Always allowed outside production. Returns `false` once the client
    /// has used up its attempts for the window.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the rate limiter.
    pub async fn register_attempt(&self, ip: &str) -> Result<bool> {
        if !self.config.production {
            return Ok(true);
        }

        let limit = self.config.login_rate_limit;
        let key = format!("login_link:{ip}");
        match self
            .limiter
            .check_and_record(&key, limit.max_attempts, limit.window)
            .await
        {
            Ok(()) => Ok(true),
            Err(AuthError::TooManyAttempts { retry_after }) => {
                tracing::debug!(ip, ?retry_after, "Login link rate limit reached");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Sign a login link for `email` and queue the login email.
    ///
    /// Returns the link.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Mail`] if the email cannot be rendered or queued.
    pub fn send_login_link(&self, email: &str) -> Result<String> {
        let url = self.signer.make_signed(
            EMAIL_LOGIN_PATH,
            &[("email", email)],
            Some(self.config.login_link_ttl),
        );

        self.mail
            .send(&Email::EmailLogin { url: url.clone() }, email, false)?;
        Ok(url)
    }

    /// Check the signature of an incoming login link.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidSignature`] if the link was tampered with
    /// or has expired.
    pub fn verify_link(&self, path: &str, query: Option<&str>) -> Result<()> {
        self.signer.verify(path, query)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use crate::memory::InMemoryRateLimiter;
    use crate::signed_url::SignatureError;
    use dreamstart_mail::{EmailAddresses, MailQueue, MailReceiver, Renderer};
    use std::time::Duration;

    fn service(production: bool) -> (EmailLoginService<InMemoryRateLimiter>, MailReceiver) {
        let (queue, receiver) = MailQueue::new();
        let mail = MailService::new(Renderer::new(false), queue, EmailAddresses::default());
        let config = AuthConfig::new("https://app.example.com", "secret")
            .with_production(production)
            .with_login_rate_limit(RateLimitConfig {
                max_attempts: 2,
                window: Duration::from_secs(60),
            })
            .with_blocked_domains(["blocked.example"]);
        (
            EmailLoginService::new(InMemoryRateLimiter::new(), mail, Arc::new(config)),
            receiver,
        )
    }

    #[test]
    fn test_is_valid() {
        let (logins, _rx) = service(false);
        assert!(logins.is_valid("ada@example.com"));
        assert!(!logins.is_valid("not-an-email"));
        assert!(!logins.is_valid("ada@mailinator.com"));
        assert!(!logins.is_valid("ada@blocked.example"));
    }

    #[tokio::test]
    async fn test_attempts_unlimited_outside_production() {
        let (logins, _rx) = service(false);
        for _ in 0..10 {
            assert!(logins.register_attempt("10.0.0.1").await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_attempts_limited_per_ip_in_production() {
        let (logins, _rx) = service(true);

        assert!(logins.register_attempt("10.0.0.1").await.unwrap());
        assert!(logins.register_attempt("10.0.0.1").await.unwrap());
        assert!(!logins.register_attempt("10.0.0.1").await.unwrap());
        assert!(logins.register_attempt("10.0.0.2").await.unwrap());
    }

    #[test]
    fn test_send_login_link_queues_signed_url() {
        let (logins, mut rx) = service(false);

        let link = logins.send_login_link("ada@example.com").unwrap();

        let parsed = url::Url::parse(&link).unwrap();
        assert_eq!(parsed.path(), EMAIL_LOGIN_PATH);
        assert!(logins.verify_link(parsed.path(), parsed.query()).is_ok());

        let job = rx.try_next().unwrap();
        assert_eq!(job.mail.to, "ada@example.com");
        assert_eq!(job.mail.subject, "Sign in to your account");
        assert!(job.mail.html.contains("email-login"));
    }

    #[test]
    fn test_tampered_link_rejected() {
        let (logins, _rx) = service(false);
        let link = logins.send_login_link("ada@example.com").unwrap();
        let tampered = link.replace("ada%40example.com", "eve%40example.com");

        let parsed = url::Url::parse(&tampered).unwrap();
        assert_eq!(
            logins.verify_link(parsed.path(), parsed.query()).unwrap_err(),
            AuthError::InvalidSignature(SignatureError::Invalid)
        );
    }
}
