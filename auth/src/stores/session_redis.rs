//! Redis-based session store.
//!
//! Sessions are stored as `session:{session_id}` → JSON-serialized
//! [`Session`], with a TTL that is refreshed on every save.
//!
//! # Example
//!
//! ```no_run
//! use dreamstart_auth::stores::RedisSessionStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisSessionStore::new("redis://127.0.0.1:6379").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::{Session, SessionId};
use chrono::Duration;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Redis-based session store with TTL-based expiration.
#[derive(Clone)]
pub struct RedisSessionStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisSessionStore {
    /// Connect to `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if Redis is unreachable.
    pub async fn new(redis_url: &str) -> Result<Self> {
        Ok(Self::from_manager(super::connect(redis_url).await?))
    }

    /// Create a store from an existing connection manager.
    #[must_use]
    pub const fn from_manager(conn_manager: ConnectionManager) -> Self {
        Self { conn_manager }
    }

    /// Get the Redis key for a session.
    fn session_key(session_id: &SessionId) -> String {
        format!("session:{}", session_id.0)
    }
}

impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: &SessionId) -> Result<Option<Session>> {
        let mut conn = self.conn_manager.clone();
        let key = Self::session_key(session_id);

        let raw: Option<String> = conn.get(&key).await.map_err(|e| {
            AuthError::InternalError(format!("Failed to get session from Redis: {e}"))
        })?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let mut session: Session = serde_json::from_str(&raw)?;
        session.mark_clean();

        // Redis TTL normally removes the key first; guard against clock skew
        // and keys that lost their TTL.
        if session.is_expired() {
            tracing::warn!(
                session_id = %session_id,
                expires_at = %session.expires_at,
                "Session expired but still present in Redis"
            );
            let _: () = conn.del(&key).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    async fn save(&self, session: &Session, ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = Self::session_key(&session.id);

        let mut stored = session.clone();
        stored.touch(ttl);
        let json = serde_json::to_string(&stored)?;

        #[allow(clippy::cast_sign_loss)]
        let ttl_seconds = ttl.num_seconds().max(1) as u64;

        let _: () = conn
            .set_ex(&key, json, ttl_seconds)
            .await
            .map_err(|e| AuthError::InternalError(format!("Failed to save session: {e}")))?;

        tracing::debug!(
            session_id = %session.id,
            authenticated = session.is_authenticated(),
            ttl_seconds,
            "Saved session"
        );

        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<()> {
        let mut conn = self.conn_manager.clone();

        let _: () = conn.del(Self::session_key(session_id)).await.map_err(|e| {
            AuthError::InternalError(format!("Failed to delete session from Redis: {e}"))
        })?;

        tracing::debug!(session_id = %session_id, "Deleted session");
        Ok(())
    }
}
