//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use vsave_media::DEFAULT_USER_AGENT;
use vsave_storage::DEFAULT_MAX_ATTEMPTS;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root for per-job scratch directories
    pub work_dir: PathBuf,
    /// How long shutdown waits for the in-flight job
    pub shutdown_timeout: Duration,
    /// User-Agent sent with every fetch
    pub user_agent: String,
    /// Object store prefix all destination folders live under
    pub base_prefix: String,
    /// Upload the post listing next to the video
    pub upload_metadata: bool,
    /// Folder allocation attempts before giving up
    pub allocator_max_attempts: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("vsave"),
            shutdown_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            base_prefix: "videos".to_string(),
            upload_metadata: false,
            allocator_max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            user_agent: std::env::var("FETCH_USER_AGENT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            base_prefix: std::env::var("S3_BASE_PREFIX").unwrap_or(defaults.base_prefix),
            upload_metadata: std::env::var("S3_UPLOAD_METADATA")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            allocator_max_attempts: std::env::var("S3_ALLOCATOR_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
        }
    }
}
