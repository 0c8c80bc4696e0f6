//! Authentication guard.

use crate::error::{AppError, ErrorRecord};
use crate::middleware::session::SessionHandle;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderValue, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use dreamstart_auth::User;
use dreamstart_auth::services::{POST_LOGIN_REDIRECT, is_local_path};

/// Where unauthenticated users are sent.
pub const LOGIN_ROUTE: &str = "/login";

/// Path prefixes reachable without logging in.
pub const OPEN_ROUTES: &[&str] = &[
    LOGIN_ROUTE,
    "/__manifest",
    "/check-email",
    "/register",
    "/email-login",
    "/health",
    "/resources/theme",
];

/// Query parameter promoted into an `Authorization: Bearer` header
/// (for iframes and links that cannot set headers).
pub const BEARER_TOKEN_PARAM: &str = "bearerToken";

/// The logged-in user, placed in request extensions by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Returns `true` if `path` needs no login.
#[must_use]
pub fn is_open_route(path: &str) -> bool {
    OPEN_ROUTES.iter().any(|prefix| path.starts_with(prefix))
}

/// Copy `?bearerToken=` into the `Authorization` header.
pub async fn promote_bearer_token(mut req: Request, next: Next) -> Response {
    let token = req.uri().query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == BEARER_TOKEN_PARAM)
            .map(|(_, value)| value.into_owned())
    });

    if let Some(value) = token.and_then(|t| HeaderValue::from_str(&format!("Bearer {t}")).ok()) {
        req.headers_mut().insert(AUTHORIZATION, value);
    }

    next.run(req).await
}

/// Resolve the session's user and guard private routes.
///
/// Unauthenticated requests to private routes remember where they were
/// going (`post-login-redirect`) and are redirected to the login page.
///
/// # Errors
///
/// Returns a 500 if the session middleware is missing or the user lookup
/// fails.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let handle = req
        .extensions()
        .get::<SessionHandle>()
        .cloned()
        .ok_or_else(|| AppError::internal("Session middleware not installed"))?;

    let user_id = handle.lock().await.user_id.clone();
    let user = match user_id {
        Some(id) => state.users.find_by_id(&id).await?,
        None => None,
    };

    if let Some(user) = user {
        let user_id = user.id.to_string();
        req.extensions_mut().insert(AuthUser(user));

        let mut response = next.run(req).await;
        if let Some(record) = response.extensions_mut().get_mut::<ErrorRecord>() {
            record.user_id = Some(user_id);
        }
        return Ok(response);
    }

    if is_open_route(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let target = req
        .uri()
        .path_and_query()
        .map_or_else(|| "/".to_string(), ToString::to_string);
    tracing::debug!(target = %target, "Unauthenticated request, redirecting to login");
    if is_local_path(&target) {
        handle.lock().await.put(POST_LOGIN_REDIRECT, target);
    }

    Ok(Redirect::to(LOGIN_ROUTE).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_routes() {
        assert!(is_open_route("/login"));
        assert!(is_open_route("/email-login"));
        assert!(is_open_route("/check-email"));
        assert!(is_open_route("/resources/theme"));
        assert!(is_open_route("/__manifest?p=/"));
        assert!(!is_open_route("/"));
        assert!(!is_open_route("/logout"));
        assert!(!is_open_route("/settings"));
    }
}
