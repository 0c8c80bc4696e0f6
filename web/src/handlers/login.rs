//! Login page and login-link requests.

use crate::error::AppError;
use crate::extractors::{ClientIp, FormInput, OptionalUser};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use dreamstart_auth::User;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Shown when the address is rejected.
pub const INVALID_PROVIDER_MESSAGE: &str = "Invalid email provider. Please use a different email.";

/// Shown when the client is rate limited.
pub const TOO_MANY_ATTEMPTS_MESSAGE: &str = "Too many attempts. Please try again later.";

/// Submissions accepted by `POST /login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum LoginAction {
    /// Send a login link.
    Login {
        /// Recipient, already checked to be an address.
        email: String,
    },
}

/// Login page data.
#[derive(Debug, Serialize)]
pub struct LoginPage {
    /// The logged-in user, if any.
    pub user: Option<User>,
}

/// Login page.
///
/// # Endpoint
///
/// ```text
/// GET /login
/// ```
#[allow(clippy::unused_async)]
pub async fn show(OptionalUser(user): OptionalUser) -> Json<LoginPage> {
    Json(LoginPage { user })
}

/// Request a login link.
///
/// # Endpoint
///
/// ```text
/// POST /login
/// intent=login&email=user@example.com
/// ```
///
/// # Responses
///
/// - `303` to `/check-email?email=…` once the link is queued
/// - `400 { "error": … }` for throwaway addresses or too many attempts
/// - `422` if the form is invalid
///
/// # Errors
///
/// Returns a validation error or a 500 if the link cannot be queued.
pub async fn submit(
    State(state): State<AppState>,
    client_ip: ClientIp,
    FormInput(input): FormInput,
) -> Result<Response, AppError> {
    let LoginAction::Login { email } = state.forms.login.parse(&input)?;
    let email = email.as_str();

    if !state.email_login.is_valid(email) {
        return Ok(form_error(INVALID_PROVIDER_MESSAGE));
    }

    let ip = client_ip.0.to_string();
    if !state.email_login.register_attempt(&ip).await? {
        tracing::warn!(ip = %ip, email, "Client exceeded login attempts");
        return Ok(form_error(TOO_MANY_ATTEMPTS_MESSAGE));
    }

    state.email_login.send_login_link(email)?;

    let query = serde_urlencoded::to_string([("email", email)]).map_err(AppError::unexpected)?;
    Ok(Redirect::to(&format!("/check-email?{query}")).into_response())
}

fn form_error(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

/// `GET /check-email` query.
#[derive(Debug, Deserialize)]
pub struct CheckEmailQuery {
    /// Address the link was sent to.
    pub email: Option<String>,
}

/// "Check your email" page data.
#[derive(Debug, Serialize)]
pub struct CheckEmailPage {
    /// Address the link was sent to.
    pub email: Option<String>,
    /// Offer an "Open Gmail" shortcut.
    pub open_gmail: bool,
}

/// "Check your email" page.
///
/// # Endpoint
///
/// ```text
/// GET /check-email?email=user@gmail.com
/// ```
#[allow(clippy::unused_async)]
pub async fn check_email(Query(query): Query<CheckEmailQuery>) -> Json<CheckEmailPage> {
    let open_gmail = query
        .email
        .as_deref()
        .is_some_and(|email| email.ends_with("@gmail.com"));
    Json(CheckEmailPage {
        email: query.email,
        open_gmail,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::Forms;

    #[test]
    fn test_login_action_parses() {
        let input = json!({ "intent": "login", "email": "ada@example.com", "extra": 1 });
        let action: LoginAction = Forms::new()
            .unwrap()
            .login
            .parse(input.as_object().unwrap())
            .unwrap();
        assert_eq!(
            action,
            LoginAction::Login {
                email: "ada@example.com".into()
            }
        );
    }

    #[tokio::test]
    async fn test_check_email_offers_gmail() {
        let Json(page) = check_email(Query(CheckEmailQuery {
            email: Some("ada@gmail.com".into()),
        }))
        .await;
        assert!(page.open_gmail);

        let Json(page) = check_email(Query(CheckEmailQuery {
            email: Some("ada@example.com".into()),
        }))
        .await;
        assert!(!page.open_gmail);

        let Json(page) = check_email(Query(CheckEmailQuery { email: None })).await;
        assert!(!page.open_gmail);
    }
}
