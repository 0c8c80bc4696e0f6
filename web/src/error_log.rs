//! Persisted error log.
//!
//! Server errors are written to the `error_logs` table together with the
//! request that caused them, so they can be inspected without log access.

use crate::error::ErrorRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Error log persistence failure.
#[derive(Debug, Error)]
pub enum ErrorLogError {
    /// The backing store rejected the entry.
    #[error("Error log storage failed: {0}")]
    Storage(String),
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for ErrorLogError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Request details stored with an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Request URL (path and query).
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Client IP.
    pub ip: String,
    /// `User-Agent` header.
    pub user_agent: Option<String>,
    /// Authenticated user, if any.
    pub user_id: Option<String>,
    /// Correlation id of the request.
    pub correlation_id: String,
    /// When the error happened.
    pub timestamp: DateTime<Utc>,
}

/// A row of the `error_logs` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorLogEntry {
    /// Severity (`error`).
    pub level: String,
    /// Error name.
    pub name: Option<String>,
    /// Error message.
    pub message: String,
    /// Source chain.
    pub stack: Option<String>,
    /// Request context as JSON.
    pub context: Value,
    /// Host that served the request.
    pub hostname: String,
    /// Server process id.
    pub pid: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Storage for error log entries.
pub trait ErrorLogRepository: Send + Sync {
    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorLogError::Storage`] if the write fails.
    fn insert(
        &self,
        entry: &ErrorLogEntry,
    ) -> impl std::future::Future<Output = Result<(), ErrorLogError>> + Send;
}

/// In-memory error log, for tests and development.
#[derive(Debug, Clone, Default)]
pub struct InMemoryErrorLogRepository {
    entries: Arc<Mutex<Vec<ErrorLogEntry>>>,
}

impl InMemoryErrorLogRepository {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<ErrorLogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl ErrorLogRepository for InMemoryErrorLogRepository {
    async fn insert(&self, entry: &ErrorLogEntry) -> Result<(), ErrorLogError> {
        self.entries
            .lock()
            .map_err(|_| ErrorLogError::Storage("Mutex lock failed".into()))?
            .push(entry.clone());
        Ok(())
    }
}

/// PostgreSQL error log.
#[cfg(feature = "postgres")]
#[derive(Debug, Clone)]
pub struct PostgresErrorLogRepository {
    pool: sqlx::PgPool,
}

#[cfg(feature = "postgres")]
impl PostgresErrorLogRepository {
    /// Create a repository on `pool`.
    #[must_use]
    pub const fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "postgres")]
impl ErrorLogRepository for PostgresErrorLogRepository {
    async fn insert(&self, entry: &ErrorLogEntry) -> Result<(), ErrorLogError> {
        sqlx::query(
            r"
            INSERT INTO error_logs
                (level, name, message, stack, context, hostname, pid, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ",
        )
        .bind(&entry.level)
        .bind(&entry.name)
        .bind(&entry.message)
        .bind(&entry.stack)
        .bind(&entry.context)
        .bind(&entry.hostname)
        .bind(i32::try_from(entry.pid).ok())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Error log storage chosen at startup.
#[derive(Debug, Clone)]
pub enum ErrorLogBackend {
    /// Process-local storage.
    Memory(InMemoryErrorLogRepository),
    /// PostgreSQL.
    #[cfg(feature = "postgres")]
    Postgres(PostgresErrorLogRepository),
}

impl ErrorLogRepository for ErrorLogBackend {
    async fn insert(&self, entry: &ErrorLogEntry) -> Result<(), ErrorLogError> {
        match self {
            Self::Memory(repo) => repo.insert(entry).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(repo) => repo.insert(entry).await,
        }
    }
}

/// Records server errors with host and request context.
#[derive(Debug, Clone)]
pub struct ErrorLogService<R> {
    repository: R,
    hostname: Arc<str>,
    pid: u32,
}

impl<R: ErrorLogRepository> ErrorLogService<R> {
    /// Create a service for this process.
    #[must_use]
    pub fn new(repository: R) -> Self {
        Self::with_host(repository, current_hostname(), std::process::id())
    }

    /// Create a service with an explicit host identity.
    #[must_use]
    pub fn with_host(repository: R, hostname: impl Into<String>, pid: u32) -> Self {
        Self {
            repository,
            hostname: Arc::from(hostname.into()),
            pid,
        }
    }

    /// The underlying repository.
    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Persist `record`. Failures are traced, never returned.
    pub async fn log_error(&self, record: &ErrorRecord, context: &RequestContext) {
        let context = serde_json::to_value(context).unwrap_or(Value::Null);
        let entry = ErrorLogEntry {
            level: "error".to_string(),
            name: Some(record.name.clone()),
            message: record.message.clone(),
            stack: record.stack.clone(),
            context,
            hostname: self.hostname.to_string(),
            pid: self.pid,
            created_at: Utc::now(),
        };

        if let Err(e) = self.repository.insert(&entry).await {
            tracing::error!(error = %e, "Failed to save error log");
        }
    }
}

/// Host name from `HOSTNAME` or `/etc/hostname`.
fn current_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn context() -> RequestContext {
        RequestContext {
            url: "/projects?page=2".into(),
            method: "GET".into(),
            ip: "10.0.0.1".into(),
            user_agent: Some("curl/8".into()),
            user_id: Some("u1".into()),
            correlation_id: "5f0c7f4e-6d5e-4a8c-9d2b-1c3e5a7b9d0f".into(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_log_error_stores_context() {
        let logs = ErrorLogService::with_host(InMemoryErrorLogRepository::new(), "web-1", 42);
        let record = ErrorRecord {
            name: "INTERNAL_SERVER_ERROR".into(),
            message: "boom".into(),
            stack: Some("boom\n\nCaused by: io".into()),
            user_id: Some("u1".into()),
        };

        logs.log_error(&record, &context()).await;

        let entries = logs.repository().entries();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.level, "error");
        assert_eq!(entry.message, "boom");
        assert_eq!(entry.hostname, "web-1");
        assert_eq!(entry.pid, 42);
        assert_eq!(entry.context["userAgent"], "curl/8");
        assert_eq!(entry.context["userId"], "u1");
        assert_eq!(entry.context["url"], "/projects?page=2");
        assert_eq!(entry.context["correlationId"], "5f0c7f4e-6d5e-4a8c-9d2b-1c3e5a7b9d0f");
    }

    #[test]
    fn test_hostname_never_empty() {
        assert!(!current_hostname().is_empty());
    }
}
