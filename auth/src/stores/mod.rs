//! Production storage implementations.
//!
//! - **Session Store** (Redis) - ephemeral session storage with TTL
//! - **Rate Limiter** (Redis) - sliding-window attempt counting
//! - **User Repository** (PostgreSQL, `postgres` feature) - users and workspaces
//!
//! The `*Backend` enums pick an implementation at startup: the production
//! store when its service is configured, the in-memory one otherwise.

#[cfg(feature = "postgres")]
pub mod postgres;
pub mod rate_limiter_redis;
pub mod session_redis;

#[cfg(feature = "postgres")]
pub use postgres::PostgresUserRepository;
pub use rate_limiter_redis::RedisRateLimiter;
pub use session_redis::RedisSessionStore;

use crate::error::{AuthError, Result};
use crate::memory::{InMemoryRateLimiter, InMemorySessionStore, InMemoryUserRepository};
use crate::providers::{RateLimiter, SessionStore, UserRepository};
use crate::state::{Session, SessionId, User, UserId, Workspace};
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Open a managed Redis connection, shared by the Redis stores.
///
/// # Errors
///
/// Returns [`AuthError::InternalError`] if the URL is invalid or Redis is
/// unreachable.
pub async fn connect(redis_url: &str) -> Result<ConnectionManager> {
    let client = redis::Client::open(redis_url)
        .map_err(|e| AuthError::InternalError(format!("Invalid Redis URL: {e}")))?;
    ConnectionManager::new(client)
        .await
        .map_err(|e| AuthError::InternalError(format!("Failed to connect to Redis: {e}")))
}

/// User storage chosen at startup.
#[derive(Clone)]
pub enum UserBackend {
    /// Process-local storage.
    Memory(InMemoryUserRepository),
    /// PostgreSQL.
    #[cfg(feature = "postgres")]
    Postgres(PostgresUserRepository),
}

impl UserRepository for UserBackend {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>> {
        match self {
            Self::Memory(repo) => repo.find_by_id(user_id).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(repo) => repo.find_by_id(user_id).await,
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        match self {
            Self::Memory(repo) => repo.find_by_email(email).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(repo) => repo.find_by_email(email).await,
        }
    }

    async fn create_with_workspace(&self, user: &User, workspace: &Workspace) -> Result<()> {
        match self {
            Self::Memory(repo) => repo.create_with_workspace(user, workspace).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(repo) => repo.create_with_workspace(user, workspace).await,
        }
    }

    async fn workspaces_for(&self, user_id: &UserId) -> Result<Vec<Workspace>> {
        match self {
            Self::Memory(repo) => repo.workspaces_for(user_id).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(repo) => repo.workspaces_for(user_id).await,
        }
    }
}

/// Session storage chosen at startup.
#[derive(Clone)]
pub enum SessionBackend {
    /// Process-local storage.
    Memory(InMemorySessionStore),
    /// Redis.
    Redis(RedisSessionStore),
}

impl SessionStore for SessionBackend {
    async fn load(&self, session_id: &SessionId) -> Result<Option<Session>> {
        match self {
            Self::Memory(store) => store.load(session_id).await,
            Self::Redis(store) => store.load(session_id).await,
        }
    }

    async fn save(&self, session: &Session, ttl: chrono::Duration) -> Result<()> {
        match self {
            Self::Memory(store) => store.save(session, ttl).await,
            Self::Redis(store) => store.save(session, ttl).await,
        }
    }

    async fn delete(&self, session_id: &SessionId) -> Result<()> {
        match self {
            Self::Memory(store) => store.delete(session_id).await,
            Self::Redis(store) => store.delete(session_id).await,
        }
    }
}

/// Rate limiter chosen at startup.
#[derive(Clone)]
pub enum RateLimiterBackend {
    /// Process-local counters.
    Memory(InMemoryRateLimiter),
    /// Redis sorted sets.
    Redis(RedisRateLimiter),
}

impl RateLimiter for RateLimiterBackend {
    async fn check_and_record(&self, key: &str, max_attempts: u32, window: Duration) -> Result<()> {
        match self {
            Self::Memory(limiter) => limiter.check_and_record(key, max_attempts, window).await,
            Self::Redis(limiter) => limiter.check_and_record(key, max_attempts, window).await,
        }
    }
}
