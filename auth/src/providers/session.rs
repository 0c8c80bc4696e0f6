//! Session store trait.

use crate::error::Result;
use crate::state::{Session, SessionId};
use chrono::Duration;

/// Session store.
///
/// This trait abstracts over session storage (Redis).
///
/// # Implementation Notes
///
/// - Sessions are ephemeral; storage expires them after their TTL
/// - `save` refreshes the TTL (sliding expiration)
pub trait SessionStore: Send + Sync {
    /// Load a session.
    ///
    /// # Returns
    ///
    /// The session, or `None` if it does not exist or has expired.
    ///
    /// # Errors
    ///
    /// Returns error if storage is unreachable or the record is corrupt.
    fn load(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<Session>>> + Send;

    /// Create or overwrite a session with a fresh TTL.
    ///
    /// # Errors
    ///
    /// Returns error if storage is unreachable.
    fn save(
        &self,
        session: &Session,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Delete a session. Deleting a missing session is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if storage is unreachable.
    fn delete(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
