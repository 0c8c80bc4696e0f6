//! Session lifecycle: load, persist, login, logout.

use crate::error::Result;
use crate::providers::SessionStore;
use crate::state::{Session, SessionId, User};
use chrono::Duration;

/// Loads and persists sessions with a sliding TTL.
#[derive(Debug, Clone)]
pub struct SessionService<S> {
    store: S,
    ttl: Duration,
}

impl<S: SessionStore> SessionService<S> {
    /// Create a service storing sessions in `store` for `ttl`.
    #[must_use]
    pub const fn new(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Session lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Load the session named by `raw_id`, or start a fresh anonymous one.
    ///
    /// Malformed ids never reach storage. A fresh session is only persisted
    /// once something is written to it.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn load(&self, raw_id: Option<&str>) -> Result<Session> {
        if let Some(raw) = raw_id.filter(|raw| SessionId::is_well_formed(raw)) {
            if let Some(session) = self.store.load(&SessionId(raw.to_string())).await? {
                return Ok(session);
            }
        }
        let mut session = Session::new(self.ttl);
        session.mark_clean();
        Ok(session)
    }

    /// Persist `session` if it changed or belongs to a logged-in user.
    ///
    /// Returns `true` if the session was written.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn commit(&self, session: &mut Session) -> Result<bool> {
        if !session.is_dirty() && !session.is_authenticated() {
            return Ok(false);
        }

        session.touch(self.ttl);
        self.store.save(session, self.ttl).await?;
        session.mark_clean();
        Ok(true)
    }

    /// Bind `user` to the session under a new id and persist it.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn login(&self, session: &mut Session, user: &User) -> Result<()> {
        let previous = session.rotate_for(&user.id);
        self.store.delete(&previous).await?;
        self.commit(session).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(())
    }

    /// Delete the session and replace it with a fresh anonymous one.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn logout(&self, session: &mut Session) -> Result<()> {
        self.store.delete(&session.id).await?;

        if let Some(user_id) = &session.user_id {
            tracing::info!(%user_id, "User logged out");
        }

        *session = Session::new(self.ttl);
        session.mark_clean();
        Ok(())
    }
}
