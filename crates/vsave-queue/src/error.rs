//! Queue error types.

use thiserror::Error;
use vsave_ledger::LedgerError;
use vsave_models::{JobId, PayloadError};

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Validation error: {0}")]
    Validation(#[from] PayloadError),

    #[error("Job {0} not found")]
    JobNotFound(JobId),

    #[error("Dispatch queue is closed")]
    Closed,

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for QueueError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(id) => Self::JobNotFound(id),
            other => Self::Ledger(other),
        }
    }
}

impl QueueError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueueError::JobNotFound(_))
    }
}
