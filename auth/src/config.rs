//! Authentication configuration.
//!
//! Values are provided by the application at startup, never hardcoded in
//! services.

use chrono::Duration;

/// Rate limit applied to login-link requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Attempts allowed per window.
    ///
    /// Default: 5
    pub max_attempts: u32,

    /// Sliding window length.
    ///
    /// Default: 1 hour
    pub window: std::time::Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: std::time::Duration::from_secs(60 * 60),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Public base URL (e.g., "https://app.example.com"). Login links are
    /// rooted here.
    pub app_url: String,

    /// Secret used to sign URLs.
    pub app_key: String,

    /// Whether the app runs in production. Rate limiting only applies there.
    pub production: bool,

    /// Session lifetime, refreshed on every write.
    ///
    /// Default: 30 days
    pub session_ttl: Duration,

    /// Login link validity.
    ///
    /// Default: 1 hour
    pub login_link_ttl: Duration,

    /// Login-link rate limit.
    pub login_rate_limit: RateLimitConfig,

    /// Disposable-mail domains rejected in addition to the built-in list.
    pub blocked_domains: Vec<String>,
}

impl AuthConfig {
    /// Create a configuration with default lifetimes.
    #[must_use]
    pub fn new(app_url: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            app_url: app_url.into(),
            app_key: app_key.into(),
            ..Self::default()
        }
    }

    /// Mark the configuration as production.
    #[must_use]
    pub const fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Set session lifetime.
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set login-link rate limit.
    #[must_use]
    pub const fn with_login_rate_limit(mut self, limit: RateLimitConfig) -> Self {
        self.login_rate_limit = limit;
        self
    }

    /// Add disposable domains to reject.
    #[must_use]
    pub fn with_blocked_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_domains
            .extend(domains.into_iter().map(|d| d.into().to_lowercase()));
        self
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:3333".to_string(),
            app_key: String::new(),
            production: false,
            session_ttl: Duration::days(30),
            login_link_ttl: Duration::hours(1),
            login_rate_limit: RateLimitConfig::default(),
            blocked_domains: Vec::new(),
        }
    }
}
