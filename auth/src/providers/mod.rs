//! Provider traits for authentication storage.
//!
//! Each storage concern has one trait with an in-memory implementation
//! (see [`crate::memory`]) and a production implementation (see
//! [`crate::stores`]).

pub mod rate_limiter;
pub mod session;
pub mod user;

pub use rate_limiter::RateLimiter;
pub use session::SessionStore;
pub use user::UserRepository;
