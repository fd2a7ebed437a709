//! Pipeline metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_COMPLETED_TOTAL: &str = "vsave_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "vsave_jobs_failed_total";
    pub const JOB_DURATION_SECONDS: &str = "vsave_job_duration_seconds";
    pub const DOWNLOAD_BYTES_TOTAL: &str = "vsave_download_bytes_total";
    pub const LEDGER_FINALIZE_ERRORS_TOTAL: &str = "vsave_ledger_finalize_errors_total";
}

pub fn record_job_completed(duration_secs: f64) {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "status" => "completed").record(duration_secs);
}

/// Record a failed job, labelled with the stage that failed.
pub fn record_job_failed(stage: &'static str, duration_secs: f64) {
    counter!(names::JOBS_FAILED_TOTAL, "stage" => stage).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "status" => "failed").record(duration_secs);
}

pub fn record_download_bytes(bytes: u64) {
    counter!(names::DOWNLOAD_BYTES_TOTAL).increment(bytes);
}

pub fn record_finalize_error() {
    counter!(names::LEDGER_FINALIZE_ERRORS_TOTAL).increment(1);
}
