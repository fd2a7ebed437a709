//! Shared data models for the VSave job service.
//!
//! This crate provides Serde-serializable types for:
//! - Job records as stored in the ledger
//! - Job status and terminal outcomes
//! - Submission payloads and their validation

pub mod job;
pub mod payload;

pub use job::{Job, JobId, JobOutcome, JobRef, JobStatus, ParseJobStatusError};
pub use payload::{JobPayload, PayloadError};
