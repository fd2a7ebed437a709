//! Video save worker.
//!
//! This crate provides:
//! - The per-job pipeline: resolve, download, mux, allocate, upload
//! - The single-consumer executor that drains the dispatch queue and
//!   writes each job's terminal status
//! - Structured job logging and pipeline metrics

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::WorkerConfig;
pub use error::{PipelineError, WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use pipeline::{Pipeline, METADATA_FILE_NAME, SUCCESS_MESSAGE_PREFIX};
