//! Axum middleware.
//!
//! Applied outermost first:
//!
//! 1. [`correlation_id_layer`]: request span and `X-Correlation-ID` header
//! 2. [`error_logging_middleware`]: persists 5xx responses
//! 3. [`promote_bearer_token`]: `?bearerToken=` becomes an `Authorization` header
//! 4. [`session_middleware`]: loads and saves the session, manages its cookie
//! 5. [`auth_middleware`]: resolves the user and guards private routes

pub mod auth;
pub mod correlation;
pub mod error_logging;
pub mod session;

pub use auth::{AuthUser, LOGIN_ROUTE, OPEN_ROUTES, auth_middleware, is_open_route, promote_bearer_token};
pub use correlation::{CORRELATION_ID_HEADER, CorrelationIdExt, CorrelationIdLayer, correlation_id_layer};
pub use error_logging::error_logging_middleware;
pub use session::{SESSION_COOKIE, SessionHandle, session_middleware};
