//! Ledger error types.

use thiserror::Error;
use vsave_models::JobId;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur while reading or writing the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Job {0} not found")]
    NotFound(JobId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt row {id}: {reason}")]
    CorruptRow { id: i64, reason: String },
}

impl LedgerError {
    pub fn not_found(id: JobId) -> Self {
        Self::NotFound(id)
    }

    pub fn corrupt_row(id: i64, reason: impl Into<String>) -> Self {
        Self::CorruptRow {
            id,
            reason: reason.into(),
        }
    }

    /// Check if this error means the job does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }
}
