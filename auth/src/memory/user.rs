//! In-memory user repository.

use crate::error::{AuthError, Result};
use crate::providers::UserRepository;
use crate::state::{User, UserId, Workspace};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    workspaces: Vec<Workspace>,
}

/// In-memory user repository.
///
/// Users and workspaces share one lock, so `create_with_workspace` is atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn user_count(&self) -> Result<usize> {
        Ok(self.lock()?.users.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".into()))
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>> {
        Ok(self.lock()?.users.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create_with_workspace(&self, user: &User, workspace: &Workspace) -> Result<()> {
        let mut tables = self.lock()?;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailAlreadyExists);
        }
        if tables.users.contains_key(&user.id) {
            return Err(AuthError::DatabaseError(format!("Duplicate user id {}", user.id)));
        }

        tables.users.insert(user.id.clone(), user.clone());
        tables.workspaces.push(workspace.clone());
        Ok(())
    }

    async fn workspaces_for(&self, user_id: &UserId) -> Result<Vec<Workspace>> {
        Ok(self
            .lock()?
            .workspaces
            .iter()
            .filter(|w| &w.user_id == user_id)
            .cloned()
            .collect())
    }
}
