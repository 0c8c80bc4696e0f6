//! Authenticated home page.

use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::WebResult;
use axum::{Json, extract::State};
use dreamstart_auth::{User, Workspace};
use serde::Serialize;

/// Home page data.
#[derive(Debug, Serialize)]
pub struct HomePage {
    /// The logged-in user.
    pub user: User,
    /// The user's workspaces.
    pub workspaces: Vec<Workspace>,
}

/// Home page.
///
/// # Endpoint
///
/// ```text
/// GET /
/// ```
///
/// # Errors
///
/// Returns 401 without a login, or a storage failure.
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> WebResult<Json<HomePage>> {
    let workspaces = state.users.workspaces(&user.id).await?;
    Ok(Json(HomePage { user, workspaces }))
}
