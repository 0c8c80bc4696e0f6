//! Application state for Axum handlers.

use crate::error_log::{ErrorLogBackend, ErrorLogService, InMemoryErrorLogRepository};
use crate::extractors::TrustedProxies;
use dreamstart_auth::memory::{InMemoryRateLimiter, InMemorySessionStore, InMemoryUserRepository};
use dreamstart_auth::services::{EmailLoginService, SessionService, SignUpService, UserService};
use dreamstart_auth::{
    AuthConfig, IdGenerator, RateLimiterBackend, SessionBackend, UserBackend, UuidGenerator,
};
use dreamstart_forms::rules::{boolean, one_of, string};
use dreamstart_forms::{IntentValidator, Schema, SchemaError};
use dreamstart_mail::MailService;
use std::sync::Arc;

/// Intent validators for every form the app accepts.
///
/// Built once at startup; a malformed declaration fails there.
#[derive(Debug)]
pub struct Forms {
    /// `POST /login`: `login { email }`.
    pub login: IntentValidator,
    /// `POST /logout`: `log_out {}`.
    pub logout: IntentValidator,
    /// `POST /resources/theme`: `change-theme { theme }` and
    /// `set-prefer-dark-mode { prefersDarkMode }`.
    pub theme: IntentValidator,
}

impl Forms {
    /// Build every validator.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if a declaration is invalid.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            login: IntentValidator::builder()
                .intent("login", Schema::new().field("email", string().email()))
                .build()?,
            logout: IntentValidator::builder()
                .intent("log_out", Schema::new())
                .build()?,
            theme: IntentValidator::builder()
                .intent(
                    "change-theme",
                    Schema::new().field("theme", one_of(["dark", "app", "system"])),
                )
                .intent(
                    "set-prefer-dark-mode",
                    Schema::new().field("prefersDarkMode", boolean()),
                )
                .build()?,
        })
    }
}

/// Storage and delivery backends chosen at startup.
pub struct Backends {
    /// User storage.
    pub users: UserBackend,
    /// Session storage.
    pub sessions: SessionBackend,
    /// Rate limiter.
    pub rate_limiter: RateLimiterBackend,
    /// Error log storage.
    pub error_logs: ErrorLogBackend,
}

impl Backends {
    /// Everything in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            users: UserBackend::Memory(InMemoryUserRepository::new()),
            sessions: SessionBackend::Memory(InMemorySessionStore::new()),
            rate_limiter: RateLimiterBackend::Memory(InMemoryRateLimiter::new()),
            error_logs: ErrorLogBackend::Memory(InMemoryErrorLogRepository::new()),
        }
    }
}

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Authentication settings.
    pub config: Arc<AuthConfig>,
    /// Users and workspaces.
    pub users: UserService<UserBackend>,
    /// Sessions.
    pub sessions: SessionService<SessionBackend>,
    /// Login links.
    pub email_login: EmailLoginService<RateLimiterBackend>,
    /// Post sign-up and login hooks.
    pub sign_up: SignUpService,
    /// Persisted error log.
    pub error_logs: ErrorLogService<ErrorLogBackend>,
    /// Form validators.
    pub forms: Arc<Forms>,
    /// Proxies allowed to report the client address.
    pub trusted_proxies: TrustedProxies,
}

impl AppState {
    /// Wire the services.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if a form declaration is invalid.
    pub fn new(
        config: AuthConfig,
        backends: Backends,
        mail: MailService,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, SchemaError> {
        let config = Arc::new(config);
        Ok(Self {
            users: UserService::new(backends.users, ids),
            sessions: SessionService::new(backends.sessions, config.session_ttl),
            email_login: EmailLoginService::new(
                backends.rate_limiter,
                mail.clone(),
                Arc::clone(&config),
            ),
            sign_up: SignUpService::new(mail),
            error_logs: ErrorLogService::new(backends.error_logs),
            forms: Arc::new(Forms::new()?),
            trusted_proxies: TrustedProxies::default(),
            config,
        })
    }

    /// Believe forwarding headers from `proxies` as well as loopback.
    #[must_use]
    pub fn with_trusted_proxies(mut self, proxies: TrustedProxies) -> Self {
        self.trusted_proxies = proxies;
        self
    }

    /// State backed entirely by memory, with UUID ids.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if a form declaration is invalid.
    pub fn in_memory(config: AuthConfig, mail: MailService) -> Result<Self, SchemaError> {
        Self::new(config, Backends::in_memory(), mail, Arc::new(UuidGenerator))
    }
}
