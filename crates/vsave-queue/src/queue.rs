//! FIFO dispatch queue between submission and the pipeline worker.
//!
//! Unbounded and volatile: anything still waiting when the process stops
//! is lost from the queue, while its ledger row stays `queued`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};
use vsave_models::JobRef;

use crate::error::{QueueError, QueueResult};

/// Item travelling through the channel.
#[derive(Debug)]
enum Dispatch {
    Job(JobRef),
    Shutdown,
}

/// Constructor for the sender/receiver pair.
pub struct DispatchQueue;

impl DispatchQueue {
    /// Create a new queue. The receiver belongs to the single worker.
    pub fn channel() -> (DispatchSender, DispatchReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        (
            DispatchSender {
                tx,
                pending: Arc::clone(&pending),
            },
            DispatchReceiver {
                rx,
                pending,
                finished: false,
            },
        )
    }
}

/// Producer side, shared by request handlers.
#[derive(Debug, Clone)]
pub struct DispatchSender {
    tx: mpsc::UnboundedSender<Dispatch>,
    pending: Arc<AtomicUsize>,
}

impl DispatchSender {
    /// Enqueue a job. Never blocks.
    pub fn enqueue(&self, job: JobRef) -> QueueResult<()> {
        let job_id = job.id;
        self.pending.fetch_add(1, Ordering::SeqCst);

        if self.tx.send(Dispatch::Job(job)).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueError::Closed);
        }

        debug!(job_id = %job_id, "Enqueued job");
        Ok(())
    }

    /// Ask the worker to stop once everything enqueued so far is drained.
    pub fn shutdown(&self) {
        if self.tx.send(Dispatch::Shutdown).is_ok() {
            info!("Dispatch queue shutdown requested");
        }
    }

    /// Number of jobs waiting to be dequeued.
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether the worker side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side, owned by the single worker.
#[derive(Debug)]
pub struct DispatchReceiver {
    rx: mpsc::UnboundedReceiver<Dispatch>,
    pending: Arc<AtomicUsize>,
    finished: bool,
}

impl DispatchReceiver {
    /// Wait for the next job.
    ///
    /// Returns `None` once the shutdown sentinel is reached or every
    /// sender has been dropped.
    pub async fn dequeue(&mut self) -> Option<JobRef> {
        if self.finished {
            return None;
        }

        match self.rx.recv().await {
            Some(Dispatch::Job(job)) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Some(job)
            }
            Some(Dispatch::Shutdown) | None => {
                self.finished = true;
                self.rx.close();
                None
            }
        }
    }
}
