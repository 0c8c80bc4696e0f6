//! PostgreSQL storage implementations.
//!
//! This module provides persistent storage using PostgreSQL for user
//! accounts and workspaces, plus the schema migrations for every table the
//! application owns (including `error_logs`).

pub mod user;

pub use user::PostgresUserRepository;

use crate::error::{AuthError, Result};
use sqlx::PgPool;

/// Run database migrations.
///
/// # Errors
///
/// Returns error if migrations fail.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("Migration failed: {e}")))?;
    tracing::info!("Database migrations applied");
    Ok(())
}
