//! Hooks run after sign-up and login.

use crate::error::{AuthError, Result};
use crate::state::{Session, User};
use dreamstart_mail::{Email, MailService};

/// Session key holding the page to return to after login.
pub const POST_LOGIN_REDIRECT: &str = "post-login-redirect";

/// Whether `target` is a path on this site.
///
/// It must start with a single `/`; `//host` and `/\host` name another
/// host once resolved.
#[must_use]
pub fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\")
}

/// Post sign-up and post-login behaviour.
#[derive(Debug, Clone)]
pub struct SignUpService {
    mail: MailService,
}

impl SignUpService {
    /// Create the service.
    #[must_use]
    pub const fn new(mail: MailService) -> Self {
        Self { mail }
    }

    /// Welcome a freshly created user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Mail`] if the welcome email cannot be queued.
    pub fn post_sign_up(&self, user: &User) -> Result<()> {
        tracing::info!(user_id = %user.id, "Created new user");
        self.mail.send(&Email::Welcome, &user.email, false)?;
        Ok(())
    }

    /// Resolve where to send the user after logging in.
    ///
    /// Consumes the stored redirect. `/logout`, non-local targets, and
    /// anything resolving to another origin fall back to `/`. The result is
    /// absolute, resolved against `request_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if `request_url` is not absolute.
    pub fn post_login(&self, session: &mut Session, request_url: &str) -> Result<String> {
        let stored = session
            .pull(POST_LOGIN_REDIRECT)
            .and_then(|value| value.as_str().map(str::to_string));

        let base = url::Url::parse(request_url)
            .map_err(|e| AuthError::InternalError(format!("Bad request URL: {e}")))?;
        let home = base
            .join("/")
            .map_err(|e| AuthError::InternalError(format!("Bad request URL: {e}")))?;

        let resolved = stored
            .filter(|target| is_local_path(target) && !target.starts_with("/logout"))
            .and_then(|target| base.join(&target).ok())
            .filter(|url| url.origin() == base.origin());

        let redirect = resolved.unwrap_or(home);
        tracing::info!(redirect = %redirect, "Post-login redirect");
        Ok(redirect.into())
    }
}
