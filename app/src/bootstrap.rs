//! Service wiring.
//!
//! Picks a backend for every store, runs migrations, starts the mail
//! worker, and assembles the [`AppState`].

use crate::config::Config;
use anyhow::bail;
use dreamstart_auth::stores::{RedisRateLimiter, RedisSessionStore};
use dreamstart_auth::{RateLimiterBackend, SessionBackend, UuidGenerator};
use dreamstart_mail::{
    ConsoleMailer, MailConfig, MailQueue, MailReceiver, MailService, MailWorker, Renderer,
    SmtpMailer, worker_enabled,
};
use dreamstart_web::{AppState, Backends, TrustedProxies};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A wired application.
pub struct Application {
    /// Shared handler state.
    pub state: AppState,
    /// Background mail delivery, if enabled.
    pub mail_worker: Option<JoinHandle<()>>,
    /// Undelivered queue when the worker is disabled. Held so sends still
    /// succeed.
    pub parked_mail: Option<MailReceiver>,
}

/// Build the application from `config`.
///
/// # Errors
///
/// Fails if a configured service is unreachable, migrations fail, or a
/// production deployment lacks PostgreSQL or Redis.
pub async fn build(config: &Config) -> anyhow::Result<Application> {
    let backends = database_backends(config).await?;
    let backends = redis_backends(config, backends).await?;

    let (queue, receiver) = MailQueue::new();
    let (mail_worker, parked_mail) = start_mail_worker(config, receiver)?;
    let mail = MailService::new(
        Renderer::new(config.mail.cache_static),
        queue,
        config.mail.addresses.clone(),
    );

    let state = AppState::new(
        config.auth_config()?,
        backends,
        mail,
        Arc::new(UuidGenerator),
    )?
    .with_trusted_proxies(TrustedProxies::new(config.server.trusted_proxies.iter().copied()));

    Ok(Application {
        state,
        mail_worker,
        parked_mail,
    })
}

/// Users and error logs: PostgreSQL when configured.
async fn database_backends(config: &Config) -> anyhow::Result<Backends> {
    let memory = Backends::in_memory();

    let Some(database) = &config.database else {
        if config.server.environment.is_production() {
            bail!("DATABASE_URL is required in production");
        }
        tracing::warn!("DATABASE_URL not set, keeping users in memory");
        return Ok(memory);
    };

    #[cfg(feature = "postgres")]
    {
        let pool = connect_postgres(database).await?;
        Ok(Backends {
            users: dreamstart_auth::UserBackend::Postgres(
                dreamstart_auth::stores::PostgresUserRepository::new(pool.clone()),
            ),
            error_logs: dreamstart_web::ErrorLogBackend::Postgres(
                dreamstart_web::error_log::PostgresErrorLogRepository::new(pool),
            ),
            ..memory
        })
    }

    #[cfg(not(feature = "postgres"))]
    {
        let _ = database;
        if config.server.environment.is_production() {
            bail!("DATABASE_URL is set but this build lacks the `postgres` feature");
        }
        tracing::warn!("Built without the `postgres` feature, keeping users in memory");
        Ok(memory)
    }
}

/// Connect and migrate.
#[cfg(feature = "postgres")]
pub async fn connect_postgres(database: &crate::config::DatabaseConfig) -> anyhow::Result<sqlx::PgPool> {
    use anyhow::Context;

    tracing::info!("Connecting to PostgreSQL...");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(database.max_connections)
        .connect(&database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    dreamstart_auth::stores::postgres::migrate(&pool).await?;
    tracing::info!("PostgreSQL connected");
    Ok(pool)
}

/// Sessions and rate limits: Redis when configured.
async fn redis_backends(config: &Config, backends: Backends) -> anyhow::Result<Backends> {
    let Some(redis) = &config.redis else {
        if config.server.environment.is_production() {
            bail!("REDIS_URL is required in production");
        }
        tracing::warn!("REDIS_URL not set, keeping sessions in memory");
        return Ok(backends);
    };

    tracing::info!("Connecting to Redis...");
    let manager = dreamstart_auth::stores::connect(&redis.url).await?;
    tracing::info!("Redis connected");

    Ok(Backends {
        sessions: SessionBackend::Redis(RedisSessionStore::from_manager(manager.clone())),
        rate_limiter: RateLimiterBackend::Redis(RedisRateLimiter::from_manager(manager)),
        ..backends
    })
}

fn start_mail_worker(
    config: &Config,
    receiver: MailReceiver,
) -> anyhow::Result<(Option<JoinHandle<()>>, Option<MailReceiver>)> {
    if !worker_enabled(config.server.environment.role(), config.server.release_command) {
        tracing::info!("Mail worker disabled");
        return Ok((None, Some(receiver)));
    }

    let MailConfig { smtp, .. } = &config.mail;
    let policy = config.mail.retry_policy();
    let handle = match smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "Delivering mail over SMTP");
            MailWorker::new(receiver, SmtpMailer::new(smtp)?, policy).spawn()
        }
        None => {
            tracing::info!("SMTP_HOST not set, logging mail to the console");
            MailWorker::new(receiver, ConsoleMailer, policy).spawn()
        }
    };
    Ok((Some(handle), None))
}
