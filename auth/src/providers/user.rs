//! User repository trait.

use crate::error::Result;
use crate::state::{User, UserId, Workspace};

/// User repository.
///
/// This trait abstracts over user storage (PostgreSQL in production).
pub trait UserRepository: Send + Sync {
    /// Find a user by id.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_by_id(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>>> + Send;

    /// Find a user by email.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>>> + Send;

    /// Insert a user together with a workspace: both rows or neither.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Email already exists → `AuthError::EmailAlreadyExists`
    /// - The query fails → `AuthError::DatabaseError`
    fn create_with_workspace(
        &self,
        user: &User,
        workspace: &Workspace,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Workspaces owned by `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn workspaces_for(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Workspace>>> + Send;
}
