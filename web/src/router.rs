//! Route table and middleware stack.

use crate::handlers::{email_login, health, home, login, logout, theme};
use crate::middleware::{
    auth_middleware, correlation_id_layer, error_logging_middleware, promote_bearer_token,
    session_middleware,
};
use crate::state::AppState;
use axum::{
    Extension, Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// # Routes
///
/// - `GET /health` - liveness
/// - `GET /login`, `POST /login` - login page, request a login link
/// - `GET /check-email` - "check your inbox" page
/// - `GET /email-login` - login link target
/// - `POST /logout` - end the session
/// - `GET /resources/theme`, `POST /resources/theme` - theme preferences
/// - `GET /` - authenticated home page
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/login", get(login::show).post(login::submit))
        .route("/check-email", get(login::check_email))
        .route("/email-login", get(email_login::email_login))
        .route("/logout", post(logout::logout))
        .route("/resources/theme", get(theme::show).post(theme::update))
        .route("/", get(home::index))
        // Innermost first
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .layer(from_fn(promote_bearer_token))
        .layer(from_fn_with_state(
            state.error_logs.clone(),
            error_logging_middleware,
        ))
        .layer(Extension(state.trusted_proxies.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
