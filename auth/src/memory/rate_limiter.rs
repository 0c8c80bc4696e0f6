//! In-memory rate limiter.

use crate::error::{AuthError, Result};
use crate::providers::RateLimiter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// In-memory sliding-window rate limiter.
///
/// Old entries are only removed during `check_and_record()` calls for that
/// specific key; use `RedisRateLimiter` when the process runs long.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRateLimiter {
    attempts: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
}

impl InMemoryRateLimiter {
    /// Create a new limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimiter for InMemoryRateLimiter {
    async fn check_and_record(&self, key: &str, max_attempts: u32, window: Duration) -> Result<()> {
        let mut attempts = self
            .attempts
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".into()))?;

        let now = Instant::now();
        let timestamps = attempts.entry(key.to_string()).or_default();
        timestamps.retain(|&at| now.duration_since(at) < window);

        if timestamps.len() >= max_attempts as usize {
            let retry_after = timestamps
                .first()
                .map_or(window, |&oldest| window.saturating_sub(now.duration_since(oldest)));

            tracing::warn!(
                rate_limit_exceeded = true,
                key = %key,
                attempts = timestamps.len() + 1,
                max_attempts,
                "Rate limit exceeded"
            );

            return Err(AuthError::TooManyAttempts { retry_after });
        }

        timestamps.push(now);

        tracing::debug!(
            key = %key,
            attempts = timestamps.len(),
            max_attempts,
            "Rate limit check passed"
        );

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_within_limit_then_blocks() {
        let limiter = InMemoryRateLimiter::new();

        for _ in 0..5 {
            limiter
                .check_and_record("127.0.0.1", 5, Duration::from_secs(60))
                .await
                .unwrap();
        }

        let result = limiter
            .check_and_record("127.0.0.1", 5, Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(AuthError::TooManyAttempts { .. })));

        // Other keys are unaffected.
        limiter
            .check_and_record("10.0.0.1", 5, Duration::from_secs(60))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sliding_window() {
        let limiter = InMemoryRateLimiter::new();

        for _ in 0..3 {
            limiter
                .check_and_record("k", 3, Duration::from_millis(200))
                .await
                .unwrap();
        }
        assert!(limiter.check_and_record("k", 3, Duration::from_millis(200)).await.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(limiter.check_and_record("k", 3, Duration::from_millis(200)).await.is_ok());
    }
}
