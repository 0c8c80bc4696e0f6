//! In-memory provider implementations.
//!
//! Used by tests and as the development fallback when PostgreSQL or Redis
//! is not configured. State lives behind `Arc<Mutex<_>>`, so clones share it.

pub mod rate_limiter;
pub mod session;
pub mod user;

pub use rate_limiter::InMemoryRateLimiter;
pub use session::InMemorySessionStore;
pub use user::InMemoryUserRepository;
