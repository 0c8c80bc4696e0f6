//! Login link target.

use crate::error::AppError;
use crate::extractors::CurrentSession;
use crate::state::AppState;
use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use dreamstart_auth::ProfileResult;
use dreamstart_forms::Schema;
use dreamstart_forms::rules::string;

/// Follow a login link.
///
/// Verifies the signature, finds or creates the user, logs them in, and
/// redirects to where they were heading.
///
/// # Endpoint
///
/// ```text
/// GET /email-login?email=user@example.com&expires=…&signature=…
/// ```
///
/// # Responses
///
/// - `303` to the post-login redirect
/// - `401` "The URL signature is invalid" for tampered or expired links
/// - `422` if `email` is missing or malformed
///
/// # Errors
///
/// Returns a validation error or a storage failure.
pub async fn email_login(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, AppError> {
    if let Err(e) = state.email_login.verify_link(uri.path(), uri.query()) {
        tracing::info!(error = %e, "Rejected login link");
        return Ok((StatusCode::UNAUTHORIZED, "The URL signature is invalid").into_response());
    }

    let query = dreamstart_forms::input::from_urlencoded(uri.query().unwrap_or_default())
        .map_err(|e| AppError::bad_request(format!("Invalid query string: {e}")))?;
    let fields = Schema::new()
        .field("email", string().email())
        .validate(&query)?;
    let email = fields
        .get("email")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let user = match state.users.get_or_create_user(email, None).await? {
        ProfileResult::NewUser(user) => {
            state.sign_up.post_sign_up(&user)?;
            user
        }
        ProfileResult::ExistingUser(user) => user,
    };

    let request_url = format!(
        "{}{}",
        state.config.app_url.trim_end_matches('/'),
        uri.path_and_query().map_or("/", |pq| pq.as_str())
    );

    let mut session = session.lock().await;
    state.sessions.login(&mut session, &user).await?;
    let redirect = state.sign_up.post_login(&mut session, &request_url)?;

    Ok(Redirect::to(&redirect).into_response())
}
