//! Logout.

use crate::error::AppError;
use crate::extractors::{CurrentSession, FormInput};
use crate::middleware::LOGIN_ROUTE;
use crate::state::AppState;
use axum::{extract::State, response::Redirect};
use serde::Deserialize;

/// Submissions accepted by `POST /logout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum LogoutAction {
    /// End the session.
    LogOut,
}

/// End the session.
///
/// # Endpoint
///
/// ```text
/// POST /logout
/// intent=log_out
/// ```
///
/// # Errors
///
/// Returns a validation error or a storage failure.
pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    FormInput(input): FormInput,
) -> Result<Redirect, AppError> {
    match state.forms.logout.parse(&input)? {
        LogoutAction::LogOut => {
            let mut session = session.lock().await;
            state.sessions.logout(&mut session).await?;
        }
    }

    Ok(Redirect::to(LOGIN_ROUTE))
}
