//! Core authentication types: users, workspaces, and sessions.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Unique identifier for a session.
///
/// Doubles as the bearer token for API clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new random `SessionId` (256 bits, base64url).
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Returns `true` if `raw` has the shape of a generated id.
    ///
    /// Used to reject garbage cookies before touching storage.
    #[must_use]
    pub fn is_well_formed(raw: &str) -> bool {
        raw.len() == 43
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    /// Borrow the id as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Users & Workspaces
// ═══════════════════════════════════════════════════════════════════════

/// Name of the workspace every new user receives.
pub const PERSONAL_WORKSPACE: &str = "Personal";

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Primary key.
    pub id: UserId,

    /// Login email (unique).
    pub email: String,

    /// Display name, if the user set one.
    pub full_name: Option<String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build a new, unsaved user.
    #[must_use]
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId(id.into()),
            email: email.into(),
            full_name: None,
            created_at: now,
            updated_at: Some(now),
        }
    }
}

/// A workspace owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Primary key.
    pub id: String,

    /// Owner.
    pub user_id: UserId,

    /// Display name.
    pub name: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Workspace {
    /// Build the personal workspace for `user`.
    #[must_use]
    pub fn personal(id: impl Into<String>, user: &User) -> Self {
        Self {
            id: id.into(),
            user_id: user.id.clone(),
            name: PERSONAL_WORKSPACE.to_string(),
            created_at: user.created_at,
        }
    }
}

/// Outcome of [`UserService::get_or_create_user`](crate::services::UserService::get_or_create_user).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileResult {
    /// The user was created by this call.
    NewUser(User),
    /// The user already existed.
    ExistingUser(User),
}

impl ProfileResult {
    /// The user, new or existing.
    #[must_use]
    pub const fn user(&self) -> &User {
        match self {
            Self::NewUser(user) | Self::ExistingUser(user) => user,
        }
    }

    /// Consume into the user.
    #[must_use]
    pub fn into_user(self) -> User {
        match self {
            Self::NewUser(user) | Self::ExistingUser(user) => user,
        }
    }

    /// Returns `true` if the user was created by this call.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::NewUser(_))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════════════════

/// Server-side session identified by a cookie or bearer token.
///
/// Sessions start anonymous and carry a small key/value bag (flash values
/// such as `post-login-redirect`). Mutations mark the session dirty so the
/// HTTP layer knows to persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,

    /// Authenticated user, if any.
    pub user_id: Option<UserId>,

    /// Arbitrary session values.
    pub data: Map<String, Value>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,

    #[serde(skip)]
    dirty: bool,
}

impl Session {
    /// Start a fresh anonymous session.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            user_id: None,
            data: Map::new(),
            created_at: now,
            expires_at: now + ttl,
            dirty: true,
        }
    }

    /// Returns `true` once `expires_at` has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Returns `true` if a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Returns `true` if the session changed since it was loaded.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after persisting.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Read a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Read a string value.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Store a value.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
        self.dirty = true;
    }

    /// Remove and return a value (flash semantics).
    pub fn pull(&mut self, key: &str) -> Option<Value> {
        let value = self.data.remove(key);
        if value.is_some() {
            self.dirty = true;
        }
        value
    }

    /// Bind `user` under a fresh id. Returns the previous id.
    ///
    /// Rotating the id on login prevents session fixation.
    pub fn rotate_for(&mut self, user: &UserId) -> SessionId {
        self.dirty = true;
        self.user_id = Some(user.clone());
        std::mem::replace(&mut self.id, SessionId::generate())
    }

    /// Extend the expiry to `ttl` from now.
    pub fn touch(&mut self, ttl: Duration) {
        self.expires_at = Utc::now() + ttl;
    }
}
