//! In-memory session store.

use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::{Session, SessionId};
use chrono::Duration;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory session store.
///
/// Expired sessions are dropped lazily on load.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored sessions (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn session_count(&self) -> Result<usize> {
        Ok(self
            .sessions
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .len())
    }
}

impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &SessionId) -> Result<Option<Session>> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?;

        match sessions.get(session_id) {
            Some(session) if session.is_expired() => {
                sessions.remove(session_id);
                Ok(None)
            }
            Some(session) => {
                let mut session = session.clone();
                session.mark_clean();
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session, ttl: Duration) -> Result<()> {
        let mut stored = session.clone();
        stored.touch(ttl);
        stored.mark_clean();

        self.sessions
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .insert(stored.id.clone(), stored);
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<()> {
        self.sessions
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_delete() {
        let store = InMemorySessionStore::new();
        let mut session = Session::new(Duration::hours(1));
        session.put("post-login-redirect", "/settings");

        store.save(&session, Duration::hours(1)).await.unwrap();
        let loaded = store.load(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.get_str("post-login-redirect"), Some("/settings"));
        assert!(!loaded.is_dirty());

        store.delete(&session.id).await.unwrap();
        assert!(store.load(&session.id).await.unwrap().is_none());
        store.delete(&session.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped() {
        let store = InMemorySessionStore::new();
        let session = Session::new(Duration::hours(1));
        store.save(&session, Duration::seconds(-1)).await.unwrap();

        assert!(store.load(&session.id).await.unwrap().is_none());
        assert_eq!(store.session_count().unwrap(), 0);
    }
}
