//! Job service: submission and admin operations.
//!
//! One instance is built at startup and shared with the HTTP layer. It owns
//! the ledger handle and the producer side of the dispatch queue; admin
//! operations only ever touch the ledger.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};
use vsave_ledger::JobLedger;
use vsave_models::{Job, JobId, JobOutcome, JobPayload, JobRef};

use crate::error::QueueResult;
use crate::queue::DispatchSender;

/// Counter of accepted submissions (including recovered jobs).
pub const JOBS_ENQUEUED_TOTAL: &str = "vsave_jobs_enqueued_total";

/// Submission and query surface over the ledger and queue.
#[derive(Clone)]
pub struct JobService {
    ledger: Arc<dyn JobLedger>,
    queue: DispatchSender,
}

impl JobService {
    pub fn new(ledger: Arc<dyn JobLedger>, queue: DispatchSender) -> Self {
        Self { ledger, queue }
    }

    /// Validate, persist and enqueue a submission.
    ///
    /// The payload is validated before anything is written. The stored
    /// document is the one the caller sent, unknown fields included.
    pub async fn submit(&self, payload: serde_json::Value) -> QueueResult<JobId> {
        let parsed = JobPayload::from_value(&payload)?;

        let id = self.ledger.create(&payload).await?;
        self.queue.enqueue(JobRef::new(id, parsed))?;
        counter!(JOBS_ENQUEUED_TOTAL).increment(1);

        info!(job_id = %id, queue_len = self.queue.len(), "Job queued");
        Ok(id)
    }

    pub async fn get_job(&self, id: JobId) -> QueueResult<Job> {
        Ok(self.ledger.get(id).await?)
    }

    pub async fn list_jobs(&self) -> QueueResult<Vec<Job>> {
        Ok(self.ledger.list_all().await?)
    }

    pub async fn delete_job(&self, id: JobId) -> QueueResult<()> {
        self.ledger.delete(id).await?;
        info!(job_id = %id, "Job deleted");
        Ok(())
    }

    /// Remove every job. Returns how many were deleted.
    pub async fn clear_jobs(&self) -> QueueResult<u64> {
        Ok(self.ledger.clear().await?)
    }

    /// Re-enqueue jobs a previous process left in `queued`.
    ///
    /// Must run before the first new submission so recovered jobs keep
    /// their place ahead of new ones. Rows whose stored payload no longer
    /// parses are failed instead of enqueued.
    pub async fn recover_queued(&self) -> QueueResult<usize> {
        let queued = self.ledger.list_queued().await?;
        let mut recovered = 0;

        for job in queued {
            match JobPayload::from_value(&job.payload) {
                Ok(payload) => {
                    self.queue.enqueue(JobRef::new(job.id, payload))?;
                    counter!(JOBS_ENQUEUED_TOTAL).increment(1);
                    recovered += 1;
                }
                Err(e) => {
                    warn!(job_id = %job.id, "Stored payload is invalid, failing job: {}", e);
                    let outcome = JobOutcome::failed(format!("Validation error: {e}"));
                    self.ledger.update_terminal_status(job.id, &outcome).await?;
                }
            }
        }

        if recovered > 0 {
            info!("Re-enqueued {} queued jobs from the ledger", recovered);
        }
        Ok(recovered)
    }

    /// Jobs waiting for the worker.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Check ledger connectivity.
    pub async fn ping(&self) -> QueueResult<()> {
        Ok(self.ledger.ping().await?)
    }

    /// Ledger handle shared with the worker.
    pub fn ledger(&self) -> Arc<dyn JobLedger> {
        Arc::clone(&self.ledger)
    }

    /// Producer handle, used to stop the worker.
    pub fn dispatcher(&self) -> &DispatchSender {
        &self.queue
    }
}
