//! Configuration management for the Dreamstart server.
//!
//! Loads configuration from environment variables with development
//! defaults. Optional services (PostgreSQL, Redis, SMTP) are enabled by
//! setting their URL or host.

use dreamstart_auth::{AuthConfig, RateLimitConfig};
use dreamstart_mail::{EmailAddresses, MailConfig, SmtpConfig};
use std::env;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration could not be loaded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("Invalid value {value:?} for {key}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Deployment environment (`APP_ENV`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development (default).
    #[default]
    Development,
    /// Test runs.
    Test,
    /// Production.
    Production,
}

impl Environment {
    /// Whether this is production.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Process role used to decide whether the mail worker runs.
    #[must_use]
    pub const fn role(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Development | Self::Production => "web",
        }
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        })
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server.
    pub server: ServerConfig,
    /// Public URL and signing key.
    pub app: AppConfig,
    /// PostgreSQL; `None` keeps users and error logs in memory.
    pub database: Option<DatabaseConfig>,
    /// Redis; `None` keeps sessions and rate limits in memory.
    pub redis: Option<RedisConfig>,
    /// Mail delivery.
    pub mail: MailConfig,
    /// Sessions and login links.
    pub auth: AuthSettings,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Deployment environment.
    pub environment: Environment,
    /// Set while running a release command (`RELEASE_COMMAND`): migrate
    /// and exit, without the mail worker.
    pub release_command: bool,
    /// Graceful shutdown timeout.
    pub shutdown_timeout: Duration,
    /// Reverse proxies, besides loopback, whose `X-Forwarded-For` is
    /// believed (`TRUSTED_PROXIES`, comma separated).
    pub trusted_proxies: Vec<IpAddr>,
}

/// Public application settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Public base URL.
    pub url: String,
    /// Secret used to sign URLs.
    pub key: String,
}

/// PostgreSQL configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL.
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Connection URL.
    pub url: String,
}

/// Authentication settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Session TTL.
    pub session_ttl: Duration,
    /// Login link validity.
    pub login_link_ttl: Duration,
    /// Login-link rate limit.
    pub rate_limit: RateLimitConfig,
    /// Extra disposable-mail domains to reject.
    pub blocked_domains: Vec<String>,
}

/// Signing key used outside production when `APP_KEY` is unset.
const DEVELOPMENT_KEY: &str = "dreamstart-development-key";

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value is malformed or `APP_KEY` is
    /// missing in production.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let environment = match vars.get("APP_ENV") {
            Some(value) => value.parse().map_err(|()| ConfigError::Invalid {
                key: "APP_ENV",
                value,
            })?,
            None => Environment::default(),
        };

        let server = ServerConfig {
            host: vars.string_or("HOST", "0.0.0.0"),
            port: vars.parse_or("PORT", 3333)?,
            environment,
            release_command: vars.get("RELEASE_COMMAND").is_some(),
            shutdown_timeout: Duration::from_secs(vars.parse_or("SHUTDOWN_TIMEOUT", 30)?),
            trusted_proxies: vars.list("TRUSTED_PROXIES")?,
        };

        let key = match vars.get("APP_KEY") {
            Some(key) => key,
            None if environment.is_production() => return Err(ConfigError::Missing("APP_KEY")),
            None => DEVELOPMENT_KEY.to_string(),
        };
        let app = AppConfig {
            url: vars.string_or("APP_URL", &format!("http://localhost:{}", server.port)),
            key,
        };

        let database = match vars.get("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: vars.parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            }),
            None => None,
        };

        let redis = vars.get("REDIS_URL").map(|url| RedisConfig { url });

        let smtp = match vars.get("SMTP_HOST") {
            Some(host) => {
                let mut smtp = SmtpConfig::new(host, vars.parse_or("SMTP_PORT", 587)?)
                    .with_tls(vars.parse_or("SMTP_TLS", true)?);
                if let (Some(username), Some(password)) =
                    (vars.get("SMTP_USERNAME"), vars.get("SMTP_PASSWORD"))
                {
                    smtp = smtp.with_credentials(username, password);
                }
                Some(smtp)
            }
            None => None,
        };

        let defaults = EmailAddresses::default();
        let mail = MailConfig {
            addresses: EmailAddresses {
                automation: vars.string_or("EMAIL_AUTOMATION", &defaults.automation),
                owner: vars.string_or("EMAIL_OWNER", &defaults.owner),
                support: vars.string_or("EMAIL_SUPPORT", &defaults.support),
            },
            smtp,
            cache_static: environment.is_production(),
            max_retries: vars.parse_or("MAIL_MAX_RETRIES", 3)?,
            retry_delay: Duration::from_millis(vars.parse_or("MAIL_RETRY_DELAY_MS", 1000)?),
        };

        let auth = AuthSettings {
            session_ttl: Duration::from_secs(vars.parse_or("AUTH_SESSION_TTL", 2_592_000)?), // 30 days
            login_link_ttl: Duration::from_secs(vars.parse_or("AUTH_LOGIN_LINK_TTL", 3600)?),
            rate_limit: RateLimitConfig {
                max_attempts: vars.parse_or("AUTH_RATE_LIMIT_REQUESTS", 5)?,
                window: Duration::from_secs(vars.parse_or("AUTH_RATE_LIMIT_WINDOW", 3600)?),
            },
            blocked_domains: vars
                .get("BLOCKED_EMAIL_DOMAINS")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        };

        Ok(Self {
            server,
            app,
            database,
            redis,
            mail,
            auth,
        })
    }

    /// Address to bind the HTTP listener to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Settings for the auth services.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a duration is out of range.
    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        let session_ttl = chrono_duration("AUTH_SESSION_TTL", self.auth.session_ttl)?;
        let mut config = AuthConfig::new(&self.app.url, &self.app.key)
            .with_production(self.server.environment.is_production())
            .with_session_ttl(session_ttl)
            .with_login_rate_limit(self.auth.rate_limit)
            .with_blocked_domains(self.auth.blocked_domains.iter().cloned());
        config.login_link_ttl = chrono_duration("AUTH_LOGIN_LINK_TTL", self.auth.login_link_ttl)?;
        Ok(config)
    }
}

fn chrono_duration(key: &'static str, duration: Duration) -> Result<chrono::Duration, ConfigError> {
    chrono::Duration::from_std(duration).map_err(|_| ConfigError::Invalid {
        key,
        value: duration.as_secs().to_string(),
    })
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn list<T: FromStr>(&self, key: &'static str) -> Result<Vec<T>, ConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(Vec::new());
        };
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                item.parse().map_err(|_| ConfigError::Invalid {
                    key,
                    value: item.to_string(),
                })
            })
            .collect()
    }

    fn parse_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value }),
            None => Ok(default),
        }
    }
}
