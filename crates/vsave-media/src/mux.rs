//! Video + audio muxing.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Combines a video-only and an audio-only stream into one container.
#[async_trait]
pub trait Muxer: Send + Sync {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()>;
}

/// FFmpeg stream-copy muxer. No re-encoding takes place.
#[derive(Debug, Clone, Default)]
pub struct FfmpegMuxer {
    runner: FfmpegRunner,
}

impl FfmpegMuxer {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }

    /// Command used for a mux, exposed for logging and tests.
    pub fn command(video: &Path, audio: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(output)
            .input(video)
            .input(audio)
            .map("0:v:0")
            .map("1:a:0")
            .stream_copy()
            .shortest()
            .faststart()
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
        let cmd = Self::command(video, audio, output);
        self.runner.run(&cmd).await?;

        let size = tokio::fs::metadata(output).await?.len();
        info!(output = %output.display(), bytes = size, "Muxed video and audio");
        Ok(())
    }
}
