//! The catalogue of transactional emails.
//!
//! Each email names its sender, its Markdown template, and the dummy data
//! used to preview it.

use crate::config::EmailAddresses;
use crate::error::Result;
use askama::Template;
use serde::{Deserialize, Serialize};

/// Which configured address an email is sent from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// Automated notifications (`EMAIL_AUTOMATION`).
    Automation,
    /// The product owner (`EMAIL_OWNER`).
    Owner,
    /// Support desk (`EMAIL_SUPPORT`).
    Support,
}

impl Sender {
    /// Resolve the sender to a configured address.
    #[must_use]
    pub fn address(self, addresses: &EmailAddresses) -> &str {
        match self {
            Self::Automation => &addresses.automation,
            Self::Owner => &addresses.owner,
            Self::Support => &addresses.support,
        }
    }
}

/// A transactional email with its template state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "email", rename_all = "snake_case")]
pub enum Email {
    /// Passwordless sign-in link.
    EmailLogin {
        /// Signed login URL.
        url: String,
    },
    /// Sent once after sign-up.
    Welcome,
    /// Confirms account removal.
    AccountDeletion,
}

impl Email {
    /// Every email name, in catalogue order.
    pub const NAMES: [&'static str; 3] = ["email_login", "welcome", "account_deletion"];

    /// Catalogue name (also the template file stem).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::EmailLogin { .. } => "email_login",
            Self::Welcome => "welcome",
            Self::AccountDeletion => "account_deletion",
        }
    }

    /// Configured sender for this email.
    #[must_use]
    pub const fn sender(&self) -> Sender {
        match self {
            Self::EmailLogin { .. } => Sender::Automation,
            Self::Welcome => Sender::Owner,
            Self::AccountDeletion => Sender::Support,
        }
    }

    /// Returns `true` if the email renders without per-recipient state.
    ///
    /// Static emails may be cached after their first render.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        !matches!(self, Self::EmailLogin { .. })
    }

    /// Build an email from its catalogue name, filled with dummy data.
    #[must_use]
    pub fn dummy(name: &str) -> Option<Self> {
        match name {
            "email_login" => Some(Self::EmailLogin {
                url: "https://example.com".to_string(),
            }),
            "welcome" => Some(Self::Welcome),
            "account_deletion" => Some(Self::AccountDeletion),
            _ => None,
        }
    }

    /// Render the Markdown source of this email.
    pub(crate) fn render_markdown(&self) -> Result<String> {
        let source = match self {
            Self::EmailLogin { url } => EmailLoginTemplate { url: url.as_str() }.render()?,
            Self::Welcome => WelcomeTemplate.render()?,
            Self::AccountDeletion => AccountDeletionTemplate.render()?,
        };
        Ok(source)
    }
}

#[derive(Template)]
#[template(path = "emails/email_login.md", escape = "none")]
struct EmailLoginTemplate<'a> {
    url: &'a str,
}

#[derive(Template)]
#[template(path = "emails/welcome.md", escape = "none")]
struct WelcomeTemplate;

#[derive(Template)]
#[template(path = "emails/account_deletion.md", escape = "none")]
struct AccountDeletionTemplate;
