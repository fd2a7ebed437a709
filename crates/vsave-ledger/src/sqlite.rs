//! SQLite-backed ledger.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};
use vsave_models::{Job, JobId, JobOutcome, JobStatus};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::JobLedger;

/// Default database location, created next to the process if missing.
const DEFAULT_DATABASE_URL: &str = "sqlite:jobs.db?mode=rwc";

/// Busy timeout for lock contention between handlers and the worker.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 30_000;

/// Ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// SQLite database URL
    pub database_url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
        }
    }
}

impl LedgerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: std::env::var("LEDGER_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        }
    }
}

/// Raw `jobs` row.
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: i64,
    payload: String,
    status: String,
    message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<JobRow> for Job {
    type Error = LedgerError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::from_str(&row.status)
            .map_err(|e| LedgerError::corrupt_row(row.id, e.to_string()))?;

        Ok(Job {
            id: JobId(row.id),
            payload: serde_json::from_str(&row.payload)?,
            status,
            message: row.message,
            created_at: parse_timestamp(row.id, &row.created_at)?,
            updated_at: parse_timestamp(row.id, &row.updated_at)?,
        })
    }
}

fn parse_timestamp(id: i64, value: &str) -> LedgerResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| LedgerError::corrupt_row(id, format!("bad timestamp {value:?}: {e}")))
}

const SELECT_JOBS: &str =
    "SELECT id, payload, status, message, created_at, updated_at FROM jobs";

/// Job ledger stored in SQLite.
#[derive(Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Open (or create) the database and run migrations.
    pub async fn connect(config: &LedgerConfig) -> LedgerResult<Self> {
        let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            // FULL so a committed submission survives a crash right after it returns
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(connect_options)
            .await?;

        let ledger = Self { pool };
        ledger.migrate().await?;

        info!(
            "Job ledger ready at {} ({} max connections)",
            config.database_url, config.max_connections
        );
        Ok(ledger)
    }

    /// Create from environment variables.
    pub async fn from_env() -> LedgerResult<Self> {
        Self::connect(&LedgerConfig::from_env()).await
    }

    /// Private in-memory ledger.
    ///
    /// Every pooled connection would see its own empty database, so the
    /// pool holds exactly one connection that is never recycled.
    pub async fn in_memory() -> LedgerResult<Self> {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?;

        let ledger = Self { pool };
        ledger.migrate().await?;
        Ok(ledger)
    }

    async fn migrate(&self) -> LedgerResult<()> {
        debug!("Running ledger migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Close the pool, flushing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl JobLedger for SqliteLedger {
    async fn create(&self, payload: &serde_json::Value) -> LedgerResult<JobId> {
        let payload = serde_json::to_string(payload)?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (payload, status, message, created_at, updated_at)
            VALUES (?, ?, NULL, ?, ?)
            "#,
        )
        .bind(&payload)
        .bind(JobStatus::Queued.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = JobId(result.last_insert_rowid());
        debug!(job_id = %id, "Created job");
        Ok(id)
    }

    async fn update_terminal_status(&self, id: JobId, outcome: &JobOutcome) -> LedgerResult<bool> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE jobs SET status = ?, message = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(outcome.status().as_str())
        .bind(outcome.message())
        .bind(&now)
        .bind(id.get())
        .bind(JobStatus::Queued.as_str())
        .execute(&self.pool)
        .await?;

        let updated = result.rows_affected() > 0;
        if !updated {
            debug!(job_id = %id, "Terminal status not written: job absent or already terminal");
        }
        Ok(updated)
    }

    async fn get(&self, id: JobId) -> LedgerResult<Job> {
        let row = sqlx::query_as::<_, JobRow>(&format!("{SELECT_JOBS} WHERE id = ?"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| LedgerError::not_found(id))?;

        Job::try_from(row)
    }

    async fn list_all(&self) -> LedgerResult<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!("{SELECT_JOBS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn list_queued(&self) -> LedgerResult<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!("{SELECT_JOBS} WHERE status = ? ORDER BY id"))
            .bind(JobStatus::Queued.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn delete(&self, id: JobId) -> LedgerResult<()> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::not_found(id));
        }

        debug!(job_id = %id, "Deleted job");
        Ok(())
    }

    async fn clear(&self) -> LedgerResult<u64> {
        let result = sqlx::query("DELETE FROM jobs").execute(&self.pool).await?;
        info!("Cleared {} jobs from ledger", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> LedgerResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
