//! Ledger trait.

use async_trait::async_trait;
use vsave_models::{Job, JobId, JobOutcome};

use crate::error::LedgerResult;

/// Durable record of every submitted job.
///
/// Every mutation is committed before the call returns. Implementations
/// must be safe to share between request handlers and the worker.
#[async_trait]
pub trait JobLedger: Send + Sync {
    /// Persist a new job with status `queued` and return its id.
    async fn create(&self, payload: &serde_json::Value) -> LedgerResult<JobId>;

    /// Write the terminal status and message of a queued job.
    ///
    /// Returns `false` without touching anything if the job does not
    /// exist or already reached a terminal state.
    async fn update_terminal_status(&self, id: JobId, outcome: &JobOutcome) -> LedgerResult<bool>;

    /// Fetch one job.
    async fn get(&self, id: JobId) -> LedgerResult<Job>;

    /// All jobs in insertion order.
    async fn list_all(&self) -> LedgerResult<Vec<Job>>;

    /// Jobs still waiting for the worker, in insertion order.
    async fn list_queued(&self) -> LedgerResult<Vec<Job>>;

    /// Remove one job regardless of status.
    async fn delete(&self, id: JobId) -> LedgerResult<()>;

    /// Remove every job. Returns how many rows were deleted.
    async fn clear(&self) -> LedgerResult<u64>;

    /// Check the backing store is reachable.
    async fn ping(&self) -> LedgerResult<()>;
}
