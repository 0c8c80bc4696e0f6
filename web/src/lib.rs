//! HTTP layer for Dreamstart.
//!
//! Routes, middleware, extractors, and error handling on top of Axum. The
//! handlers are thin: they validate forms, call the services from
//! `dreamstart-auth`, and shape the response.
//!
//! # Request Flow
//!
//! 1. **Correlation id** and request span
//! 2. **Session** loaded from the cookie or bearer token
//! 3. **Auth guard** resolves the user, redirects private routes to `/login`
//! 4. **Handler** validates its form by intent and calls the services
//! 5. **Session** committed, cookie refreshed
//! 6. **Server errors** persisted to the error log
//!
//! # Example
//!
//! ```no_run
//! use dreamstart_auth::AuthConfig;
//! use dreamstart_mail::{EmailAddresses, MailQueue, MailService, Renderer};
//! use dreamstart_web::{AppState, router};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let (queue, _receiver) = MailQueue::new();
//! let mail = MailService::new(Renderer::new(false), queue, EmailAddresses::default());
//! let state = AppState::in_memory(AuthConfig::new("http://localhost:3333", "key"), mail)?;
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3333").await?;
//! axum::serve(listener, router(state)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod error_log;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::{AppError, ErrorRecord, UserFacingError};
pub use error_log::{ErrorLogBackend, ErrorLogService};
pub use extractors::{
    ClientIp, CorrelationId, CurrentSession, CurrentUser, FormInput, OptionalUser, TrustedProxies,
    UserAgent,
};
pub use middleware::{CORRELATION_ID_HEADER, SESSION_COOKIE, correlation_id_layer};
pub use router::router;
pub use state::{AppState, Backends, Forms};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
