//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Why a job's pipeline run failed.
///
/// The display text becomes the job's `failed` message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Pattern error: {0}")]
    Pattern(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Mux error: {0}")]
    Mux(String),

    #[error("Upload error: {0}")]
    Upload(String),
}

impl PipelineError {
    pub fn metadata(err: impl std::fmt::Display) -> Self {
        Self::Metadata(err.to_string())
    }

    pub fn pattern(err: impl std::fmt::Display) -> Self {
        Self::Pattern(err.to_string())
    }

    pub fn download(err: impl std::fmt::Display) -> Self {
        Self::Download(err.to_string())
    }

    pub fn mux(err: impl std::fmt::Display) -> Self {
        Self::Mux(err.to_string())
    }

    pub fn upload(err: impl std::fmt::Display) -> Self {
        Self::Upload(err.to_string())
    }

    /// Pipeline stage name, used as a metrics label.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Metadata(_) => "metadata",
            PipelineError::Pattern(_) => "pattern",
            PipelineError::Download(_) => "download",
            PipelineError::Mux(_) => "mux",
            PipelineError::Upload(_) => "upload",
        }
    }
}

/// Errors building the worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Media error: {0}")]
    Media(#[from] vsave_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] vsave_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
