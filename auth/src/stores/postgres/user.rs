//! PostgreSQL user repository implementation.
//!
//! # Example
//!
//! ```no_run
//! use dreamstart_auth::stores::postgres::PostgresUserRepository;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/dreamstart").await?;
//! let repo = PostgresUserRepository::new(pool);
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::providers::UserRepository;
use crate::state::{User, UserId, Workspace};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

#[derive(FromRow)]
struct UserRow {
    id: String,
    email: String,
    full_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            email: row.email,
            full_name: row.full_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct WorkspaceRow {
    id: String,
    user_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<WorkspaceRow> for Workspace {
    fn from(row: WorkspaceRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId(row.user_id),
            name: row.name,
            created_at: row.created_at,
        }
    }
}

impl PostgresUserRepository {
    /// Create a new PostgreSQL user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, email, full_name, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(&user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, email, full_name, created_at, updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn create_with_workspace(&self, user: &User, workspace: &Workspace) -> Result<()> {
        // Dropping the transaction without commit rolls it back.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO users (id, email, full_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(&user.id.0)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO workspaces (id, user_id, name, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(&workspace.id)
        .bind(&workspace.user_id.0)
        .bind(&workspace.name)
        .bind(workspace.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(user_id = %user.id, workspace_id = %workspace.id, "Inserted user and workspace");
        Ok(())
    }

    async fn workspaces_for(&self, user_id: &UserId) -> Result<Vec<Workspace>> {
        let rows: Vec<WorkspaceRow> = sqlx::query_as(
            r"
            SELECT id, user_id, name, created_at
            FROM workspaces
            WHERE user_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Workspace::from).collect())
    }
}
