//! User lookup and registration.

use crate::error::{AuthError, Result};
use crate::id::IdGenerator;
use crate::providers::UserRepository;
use crate::state::{ProfileResult, User, UserId, Workspace};
use std::sync::Arc;

/// Creates and finds users.
///
/// Every user is created together with a `Personal` workspace.
#[derive(Clone)]
pub struct UserService<R> {
    users: R,
    ids: Arc<dyn IdGenerator>,
}

impl<R: UserRepository> UserService<R> {
    /// Create a service over `users`, minting ids with `ids`.
    #[must_use]
    pub fn new(users: R, ids: Arc<dyn IdGenerator>) -> Self {
        Self { users, ids }
    }

    /// The underlying repository.
    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.users
    }

    /// Create a user and its personal workspace.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailAlreadyExists`] if the email is taken, or a
    /// storage error.
    pub async fn create_user(&self, email: &str) -> Result<User> {
        self.insert(email, None).await
    }

    /// Return the user for `email`, creating it on first sight.
    ///
    /// `id` overrides the generator for the new user (imports).
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn get_or_create_user(&self, email: &str, id: Option<&str>) -> Result<ProfileResult> {
        if let Some(user) = self.users.find_by_email(email).await? {
            return Ok(ProfileResult::ExistingUser(user));
        }

        match self.insert(email, id).await {
            Ok(user) => Ok(ProfileResult::NewUser(user)),
            Err(AuthError::EmailAlreadyExists) => {
                // Lost a race with a concurrent sign-up.
                tracing::debug!(email, "Concurrent sign-up, using existing user");
                self.users
                    .find_by_email(email)
                    .await?
                    .map(ProfileResult::ExistingUser)
                    .ok_or(AuthError::EmailAlreadyExists)
            }
            Err(e) => Err(e),
        }
    }

    /// Find a user by email.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn get_user(&self, email: &str) -> Result<Option<User>> {
        self.users.find_by_email(email).await
    }

    /// Find a user by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>> {
        self.users.find_by_id(user_id).await
    }

    /// Workspaces owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn workspaces(&self, user_id: &UserId) -> Result<Vec<Workspace>> {
        self.users.workspaces_for(user_id).await
    }

    async fn insert(&self, email: &str, id: Option<&str>) -> Result<User> {
        let user_id = id.map_or_else(|| self.ids.generate(), str::to_string);
        let user = User::new(user_id, email);
        let workspace = Workspace::personal(self.ids.generate(), &user);

        self.users.create_with_workspace(&user, &workspace).await?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }
}
