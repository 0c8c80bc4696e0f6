//! Rate limiter trait.
//!
//! # Implementation
//!
//! Use Redis with a sliding window for distributed rate limiting.

use crate::error::Result;
use std::time::Duration;

/// Sliding-window rate limiter.
///
/// # Example
///
/// ```
/// use dreamstart_auth::memory::InMemoryRateLimiter;
/// use dreamstart_auth::providers::RateLimiter;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let limiter = InMemoryRateLimiter::new();
/// limiter.check_and_record("login_link:127.0.0.1", 5, Duration::from_secs(3600)).await?;
/// # Ok::<(), dreamstart_auth::AuthError>(())
/// # });
/// ```
pub trait RateLimiter: Send + Sync {
    /// Check the limit and record the attempt in one atomic operation.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Request allowed and recorded
    /// * `Err(AuthError::TooManyAttempts)` - Rate limit exceeded
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Rate limit exceeded → `AuthError::TooManyAttempts`
    /// - Storage error → `AuthError::InternalError`
    fn check_and_record(
        &self,
        key: &str,
        max_attempts: u32,
        window: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
