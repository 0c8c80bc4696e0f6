//! Theme preference resource.
//!
//! Preferences live in cookies so the page can render in the right theme
//! before any script runs.

use crate::error::AppError;
use crate::extractors::FormInput;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};

/// Selected theme (`dark`, `app`); absent means `system`.
pub const THEME_COOKIE: &str = "app-theme";

/// Whether the browser prefers dark mode.
pub const PREFERS_DARK_COOKIE: &str = "prefers-dark-mode";

/// Theme used when no cookie is set.
pub const DEFAULT_THEME: &str = "system";

/// A selectable theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark palette.
    Dark,
    /// The app's own palette.
    App,
    /// Follow the operating system.
    System,
}

impl Theme {
    /// Cookie value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::App => "app",
            Self::System => DEFAULT_THEME,
        }
    }
}

/// Submissions accepted by `POST /resources/theme`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "intent")]
pub enum ThemeAction {
    /// Pick a theme; `system` clears the cookie.
    #[serde(rename = "change-theme")]
    ChangeTheme {
        /// Selected theme.
        theme: Theme,
    },
    /// Record the browser's dark-mode preference.
    #[serde(rename = "set-prefer-dark-mode", rename_all = "camelCase")]
    SetPreferDarkMode {
        /// Whether dark mode is preferred.
        prefers_dark_mode: bool,
    },
}

/// Theme resource data.
#[derive(Debug, Serialize)]
pub struct ThemeData {
    /// Current theme.
    pub theme: String,
}

/// Current theme.
///
/// # Endpoint
///
/// ```text
/// GET /resources/theme
/// ```
#[allow(clippy::unused_async)]
pub async fn show(jar: CookieJar) -> Json<ThemeData> {
    let theme = jar
        .get(THEME_COOKIE)
        .map_or_else(|| DEFAULT_THEME.to_string(), |c| c.value().to_string());
    Json(ThemeData { theme })
}

/// Change theme preferences.
///
/// # Endpoint
///
/// ```text
/// POST /resources/theme
/// intent=change-theme&theme=dark
/// intent=set-prefer-dark-mode&prefersDarkMode=true
/// ```
///
/// Answers `204 No Content` with the updated cookies.
///
/// # Errors
///
/// Returns a validation error.
pub async fn update(
    State(state): State<AppState>,
    jar: CookieJar,
    FormInput(input): FormInput,
) -> Result<(CookieJar, StatusCode), AppError> {
    let jar = match state.forms.theme.parse(&input)? {
        ThemeAction::ChangeTheme {
            theme: Theme::System,
        } => jar.remove(Cookie::build(THEME_COOKIE).path("/")),
        ThemeAction::ChangeTheme { theme } => {
            jar.add(Cookie::build((THEME_COOKIE, theme.as_str())).path("/"))
        }
        ThemeAction::SetPreferDarkMode { prefers_dark_mode } => jar.add(
            Cookie::build((PREFERS_DARK_COOKIE, prefers_dark_mode.to_string())).path("/"),
        ),
    };

    Ok((jar, StatusCode::NO_CONTENT))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::Forms;
    use serde_json::{Map, Value, json};

    fn parse(input: Value) -> Result<ThemeAction, dreamstart_forms::FormError> {
        let input: Map<String, Value> = input.as_object().cloned().unwrap();
        Forms::new().unwrap().theme.parse(&input)
    }

    #[test]
    fn test_every_theme_intent_parses() {
        assert_eq!(
            parse(json!({ "intent": "change-theme", "theme": "app" })).unwrap(),
            ThemeAction::ChangeTheme { theme: Theme::App }
        );
        assert_eq!(
            parse(json!({ "intent": "set-prefer-dark-mode", "prefersDarkMode": "false" })).unwrap(),
            ThemeAction::SetPreferDarkMode {
                prefers_dark_mode: false
            }
        );
    }

    #[test]
    fn test_unknown_intent_is_a_validation_error() {
        let err = parse(json!({ "intent": "reset-theme" })).unwrap_err();
        assert!(matches!(err, dreamstart_forms::FormError::Invalid(e) if e.has_field("intent")));
    }
}
