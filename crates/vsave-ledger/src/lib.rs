//! Durable job ledger.
//!
//! This crate provides:
//! - The `JobLedger` trait consumed by the job service and the worker
//! - A SQLite implementation with WAL journaling and synchronous commits
//! - Embedded schema migrations

pub mod error;
pub mod ledger;
pub mod sqlite;

pub use error::{LedgerError, LedgerResult};
pub use ledger::JobLedger;
pub use sqlite::{LedgerConfig, SqliteLedger};
