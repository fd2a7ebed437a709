//! Job executor.
//!
//! One executor drains the dispatch queue. Jobs run strictly one at a time
//! in dequeue order, so job N+1 never starts before job N's terminal status
//! has been written.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn, Instrument};
use vsave_ledger::JobLedger;
use vsave_models::{JobOutcome, JobRef};
use vsave_queue::DispatchReceiver;

use crate::logging::JobLogger;
use crate::metrics::{record_finalize_error, record_job_completed, record_job_failed};
use crate::pipeline::{success_message, Pipeline};

/// Single consumer of the dispatch queue.
pub struct JobExecutor {
    pipeline: Arc<Pipeline>,
    ledger: Arc<dyn JobLedger>,
    receiver: DispatchReceiver,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(pipeline: Pipeline, ledger: Arc<dyn JobLedger>, receiver: DispatchReceiver) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            ledger,
            receiver,
        }
    }

    /// Process jobs until the queue is shut down. Returns the number of
    /// jobs taken off the queue.
    ///
    /// A failing job never stops the loop.
    pub async fn run(mut self) -> u64 {
        info!(
            work_dir = %self.pipeline.config().work_dir.display(),
            base_prefix = %self.pipeline.config().base_prefix,
            "Starting job executor"
        );

        let mut processed = 0;
        while let Some(job) = self.receiver.dequeue().await {
            self.execute_job(job).await;
            processed += 1;
        }

        info!(processed, "Job executor stopped");
        processed
    }

    /// Run one job and record its terminal status.
    async fn execute_job(&self, job: JobRef) {
        let logger = JobLogger::new(job.id, "save_video");
        let span = logger.create_span();

        async {
            logger.log_start(&job.payload.reddit_post_url);
            let started = Instant::now();

            let outcome = match self.pipeline.run(&job, &logger).await {
                Ok(key) => {
                    record_job_completed(started.elapsed().as_secs_f64());
                    let message = success_message(&key);
                    logger.log_completion(&message);
                    JobOutcome::completed(message)
                }
                Err(e) => {
                    record_job_failed(e.stage(), started.elapsed().as_secs_f64());
                    logger.log_error(&e.to_string());
                    JobOutcome::failed(e.to_string())
                }
            };

            self.finalize(&job, &outcome).await;
        }
        .instrument(span)
        .await
    }

    async fn finalize(&self, job: &JobRef, outcome: &JobOutcome) {
        match self.ledger.update_terminal_status(job.id, outcome).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    job_id = %job.id,
                    status = %outcome.status(),
                    "Job no longer queued in the ledger (deleted or cleared), outcome dropped"
                );
            }
            Err(e) => {
                record_finalize_error();
                error!(
                    job_id = %job.id,
                    status = %outcome.status(),
                    "Failed to record job outcome: {}", e
                );
            }
        }
    }
}
