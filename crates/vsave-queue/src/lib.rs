//! In-process job dispatch.
//!
//! This crate provides:
//! - A FIFO hand-off from submission to the single pipeline worker
//! - `JobService`, the submission and admin surface over the ledger
//! - Startup recovery of jobs left queued by a previous process

pub mod error;
pub mod queue;
pub mod service;

pub use error::{QueueError, QueueResult};
pub use queue::{DispatchQueue, DispatchReceiver, DispatchSender};
pub use service::{JobService, JOBS_ENQUEUED_TOTAL};
