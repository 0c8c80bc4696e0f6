//! Redis-backed login attempt limiter.
//!
//! Each limited key owns a sorted set `attempts:{key}` whose members are
//! attempts scored by their time in milliseconds. A single `MULTI` block
//! prunes attempts older than the window, reads what is left, and records
//! the new attempt, so concurrent requests see each other's attempts.

use crate::error::{AuthError, Result};
use crate::providers::RateLimiter;
use chrono::Utc;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Sliding-window limiter shared by every server process.
///
/// ```no_run
/// use dreamstart_auth::providers::RateLimiter;
/// use dreamstart_auth::stores::RedisRateLimiter;
/// use std::time::Duration;
///
/// # async fn example() -> dreamstart_auth::Result<()> {
/// let limiter = RedisRateLimiter::new("redis://127.0.0.1:6379").await?;
/// limiter
///     .check_and_record("login_link:203.0.113.7", 5, Duration::from_secs(3600))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: ConnectionManager,
}

impl RedisRateLimiter {
    /// Connect to `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if Redis is unreachable.
    pub async fn new(redis_url: &str) -> Result<Self> {
        Ok(Self::from_manager(super::connect(redis_url).await?))
    }

    /// Share an existing connection.
    #[must_use]
    pub const fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn attempts_key(key: &str) -> String {
        format!("attempts:{key}")
    }
}

/// How long until the oldest attempt in the window expires.
fn retry_after(oldest_ms: Option<i64>, now_ms: i64, window: Duration) -> Duration {
    let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
    oldest_ms
        .map(|oldest| oldest.saturating_add(window_ms).saturating_sub(now_ms))
        .and_then(|ms| u64::try_from(ms).ok())
        .map_or(window, Duration::from_millis)
}

impl RateLimiter for RedisRateLimiter {
    async fn check_and_record(&self, key: &str, max_attempts: u32, window: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let set = Self::attempts_key(key);
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        let attempt = format!("{now_ms}:{}", uuid::Uuid::new_v4().simple());
        let ttl_secs = i64::try_from(window.as_secs()).unwrap_or(i64::MAX).max(1);

        let (previous, oldest): (u64, Vec<(String, i64)>) = redis::pipe()
            .atomic()
            .zrembyscore(&set, "-inf", now_ms.saturating_sub(window_ms))
            .ignore()
            .zcard(&set)
            .zrange_withscores(&set, 0, 0)
            .zadd(&set, &attempt, now_ms)
            .ignore()
            .expire(&set, ttl_secs)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key, "Failed to record attempt");
                AuthError::InternalError(format!("Rate limiter unavailable: {e}"))
            })?;

        if previous < u64::from(max_attempts) {
            tracing::debug!(key, attempt = previous + 1, max_attempts, "Attempt recorded");
            return Ok(());
        }

        let retry_after = retry_after(oldest.first().map(|(_, score)| *score), now_ms, window);
        tracing::warn!(
            key,
            attempts = previous + 1,
            max_attempts,
            retry_after_secs = retry_after.as_secs(),
            "Too many attempts"
        );
        Err(AuthError::TooManyAttempts { retry_after })
    }
}
