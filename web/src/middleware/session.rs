//! Session loading and persistence.
//!
//! The session is looked up from the `Authorization: Bearer` header or the
//! session cookie, shared with handlers through a [`SessionHandle`], and
//! committed after the handler ran. Bearer clients never receive cookies.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use dreamstart_auth::Session;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "dreamstart_session";

/// Shared access to the current request's session.
#[derive(Debug, Clone)]
pub struct SessionHandle(Arc<Mutex<Session>>);

impl SessionHandle {
    /// Wrap a loaded session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    /// Lock the session. Do not hold the guard across the response.
    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.0.lock().await
    }
}

/// Bearer token from the `Authorization` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Load the session before the handler and persist it afterwards.
///
/// # Errors
///
/// Returns a 500 if the session store is unreachable.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = bearer_token(req.headers());
    let cookie_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    let session = state
        .sessions
        .load(bearer.as_deref().or(cookie_id.as_deref()))
        .await?;
    let handle = SessionHandle::new(session);
    req.extensions_mut().insert(handle.clone());

    let response = next.run(req).await;

    let mut session = handle.lock().await;
    let saved = state.sessions.commit(&mut session).await?;

    if bearer.is_some() {
        return Ok(response);
    }

    let jar = if saved {
        jar.add(session_cookie(
            session.id.to_string(),
            state.sessions.ttl(),
            state.config.production,
        ))
    } else if cookie_id.is_some_and(|id| id != session.id.as_str()) {
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    } else {
        return Ok(response);
    };

    Ok((jar, response).into_response())
}

fn session_cookie(value: String, ttl: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("id".into(), chrono::Duration::days(30), true);
        let text = cookie.to_string();

        assert!(text.starts_with("dreamstart_session=id"));
        assert!(text.contains("HttpOnly"));
        assert!(text.contains("SameSite=Lax"));
        assert!(text.contains("Secure"));
        assert!(text.contains("Max-Age=2592000"));
    }
}
