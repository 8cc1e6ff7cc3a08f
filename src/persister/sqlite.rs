//! SQLite job store backed by sqlx.
//!
//! Records live in a single `jobs` table keyed by job identifier. Schema
//! statements are applied once and tracked in `_migrations`, so
//! [`SqlitePersister::run_migrations`] is idempotent.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::{JobRecord, Persister};
use crate::error::PersistError;
use crate::executor::JobId;

/// Schema for the jobs table.
const CREATE_JOBS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY NOT NULL,
    stored_at TEXT NOT NULL
)
"#;

const CREATE_JOBS_STORED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_jobs_stored_at ON jobs (stored_at)";

fn schema_statements() -> [(&'static str, &'static str); 2] {
    [
        ("jobs_v1_table", CREATE_JOBS_TABLE),
        ("jobs_v1_stored_at_index", CREATE_JOBS_STORED_AT_INDEX),
    ]
}

/// SQLite-backed persister.
#[derive(Debug, Clone)]
pub struct SqlitePersister {
    pool: SqlitePool,
}

impl SqlitePersister {
    /// Connects to `database_url` (e.g. `sqlite://jobs.db`), creating the
    /// database file if it does not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self, PersistError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| PersistError::ConnectionFailed(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| PersistError::ConnectionFailed(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any schema statements that have not run yet.
    pub async fn run_migrations(&self) -> Result<(), PersistError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY NOT NULL,
                applied_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for (name, statement) in schema_statements() {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?1")
                    .bind(name)
                    .fetch_optional(&self.pool)
                    .await?;

            if applied.is_some() {
                continue;
            }

            let mut tx = self.pool.begin().await?;
            sqlx::query(statement).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO _migrations (name, applied_at) VALUES (?1, ?2)")
                .bind(name)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            debug!(migration = name, "Applied migration");
        }

        Ok(())
    }

    /// Lists stored jobs, newest first.
    pub async fn list_jobs(&self, limit: Option<i64>) -> Result<Vec<JobRecord>, PersistError> {
        let rows = match limit {
            Some(limit) => {
                sqlx::query("SELECT id, stored_at FROM jobs ORDER BY stored_at DESC LIMIT ?1")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT id, stored_at FROM jobs ORDER BY stored_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let stored_at: DateTime<Utc> = row.try_get("stored_at")?;
            records.push(JobRecord::new(JobId::new(id), stored_at));
        }

        Ok(records)
    }

    /// Number of stored jobs.
    pub async fn count_jobs(&self) -> Result<i64, PersistError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Persister for SqlitePersister {
    async fn store_job(&self, id: &JobId, at: DateTime<Utc>) -> Result<(), PersistError> {
        let result = sqlx::query("INSERT INTO jobs (id, stored_at) VALUES (?1, ?2)")
            .bind(id.as_str())
            .bind(at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(PersistError::Duplicate(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_persister(dir: &TempDir) -> SqlitePersister {
        let url = format!("sqlite://{}", dir.path().join("jobs.db").display());
        let persister = SqlitePersister::connect(&url)
            .await
            .expect("failed to open database");
        persister
            .run_migrations()
            .await
            .expect("migrations should apply");
        persister
    }

    #[tokio::test]
    async fn test_store_and_list_jobs() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let persister = create_test_persister(&dir).await;

        let earlier = Utc::now() - chrono::Duration::seconds(10);
        let later = Utc::now();
        persister
            .store_job(&JobId::from("job-old"), earlier)
            .await
            .expect("store should succeed");
        persister
            .store_job(&JobId::from("job-new"), later)
            .await
            .expect("store should succeed");

        let records = persister.list_jobs(None).await.expect("list should succeed");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_str(), "job-new");
        assert_eq!(records[1].id.as_str(), "job-old");

        let limited = persister.list_jobs(Some(1)).await.expect("list should succeed");
        assert_eq!(limited.len(), 1);
        assert_eq!(persister.count_jobs().await.expect("count"), 2);
    }

    #[tokio::test]
    async fn test_duplicate_job_is_rejected() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let persister = create_test_persister(&dir).await;
        let id = JobId::from("job-1");

        persister
            .store_job(&id, Utc::now())
            .await
            .expect("first store should succeed");
        let err = persister
            .store_job(&id, Utc::now())
            .await
            .expect_err("second store should fail");

        assert!(matches!(err, PersistError::Duplicate(ref dup) if dup == "job-1"));
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let persister = create_test_persister(&dir).await;

        persister
            .run_migrations()
            .await
            .expect("second migration run should be a no-op");

        let (applied,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(persister.pool())
            .await
            .expect("count migrations");
        assert_eq!(applied, 2);
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let err = SqlitePersister::connect("postgres://not-sqlite")
            .await
            .expect_err("non-sqlite url should fail");
        assert!(matches!(err, PersistError::ConnectionFailed(_)));
    }
}
