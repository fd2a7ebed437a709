//! Per-job scratch directories.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::MediaResult;

const OUTPUT_DIR: &str = "out";

/// Scratch directory holding one job's downloads and muxed output.
///
/// Downloads sit at the top level under fixed names; the muxed output goes
/// into `out/` so no output name can overwrite a mux input.
///
/// The directory and everything in it are removed when this value is
/// dropped, on success and on every error path alike.
#[derive(Debug)]
pub struct JobWorkspace {
    dir: TempDir,
}

impl JobWorkspace {
    /// Create `<root>/job-<id>-XXXXXX`. `root` is created if missing.
    pub fn create(root: &Path, job_id: impl std::fmt::Display) -> MediaResult<Self> {
        std::fs::create_dir_all(root)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("job-{}-", job_id))
            .tempdir_in(root)?;
        std::fs::create_dir(dir.path().join(OUTPUT_DIR))?;

        debug!(path = %dir.path().display(), "Created job workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn video_path(&self) -> PathBuf {
        self.dir.path().join("video.mp4")
    }

    pub fn audio_path(&self) -> PathBuf {
        self.dir.path().join("audio.mp4")
    }

    /// Path of the muxed output, named after the job's output file.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(OUTPUT_DIR).join(file_name)
    }

    /// Remove the directory now and report failures instead of ignoring them.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!(path = %path.display(), "Failed to remove job workspace: {}", e);
        }
    }
}
