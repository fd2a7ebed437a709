//! Per-job pipeline.
//!
//! Resolve the post listing, derive the audio stream, download both
//! streams, mux them, allocate a destination folder and upload. The first
//! failing step ends the run. The job's scratch directory is removed on
//! every path before the result is returned.

use std::sync::Arc;

use tracing::warn;
use vsave_media::{
    check_ffmpeg, derive_audio_url, extract_video_url, metadata_url, FfmpegMuxer, HttpFetcher,
    JobWorkspace, MediaFetcher, Muxer,
};
use vsave_models::JobRef;
use vsave_storage::{FolderAllocator, ObjectStore};

use crate::config::WorkerConfig;
use crate::error::{PipelineError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics::record_download_bytes;

/// Start of every `completed` message; the destination key follows.
pub const SUCCESS_MESSAGE_PREFIX: &str = "Video processed and saved to S3 at ";

/// Name of the uploaded post listing, next to the video.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Message recorded for a job whose video landed at `key`.
pub fn success_message(key: &str) -> String {
    format!("{}{}", SUCCESS_MESSAGE_PREFIX, key)
}

/// Fetch, mux and upload pipeline.
pub struct Pipeline {
    config: WorkerConfig,
    fetcher: Arc<dyn MediaFetcher>,
    muxer: Arc<dyn Muxer>,
    store: Arc<dyn ObjectStore>,
    allocator: FolderAllocator,
}

impl Pipeline {
    pub fn new(
        config: WorkerConfig,
        fetcher: Arc<dyn MediaFetcher>,
        muxer: Arc<dyn Muxer>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        let allocator =
            FolderAllocator::new(Arc::clone(&store)).with_max_attempts(config.allocator_max_attempts);

        Self {
            config,
            fetcher,
            muxer,
            store,
            allocator,
        }
    }

    /// Build the production pipeline: HTTP fetcher and FFmpeg muxer.
    pub fn from_config(config: WorkerConfig, store: Arc<dyn ObjectStore>) -> WorkerResult<Self> {
        std::fs::create_dir_all(&config.work_dir)?;

        if let Err(e) = check_ffmpeg() {
            warn!("{}; every mux will fail until it is installed", e);
        }

        let fetcher = Arc::new(HttpFetcher::new(&config.user_agent)?);
        Ok(Self::new(config, fetcher, Arc::new(FfmpegMuxer::default()), store))
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run one job end to end. Returns the uploaded video's key.
    pub async fn run(&self, job: &JobRef, logger: &JobLogger) -> Result<String, PipelineError> {
        let workspace =
            JobWorkspace::create(&self.config.work_dir, job.id).map_err(PipelineError::download)?;

        let result = self.run_in(&workspace, job, logger).await;

        workspace.close();
        result
    }

    async fn run_in(
        &self,
        workspace: &JobWorkspace,
        job: &JobRef,
        logger: &JobLogger,
    ) -> Result<String, PipelineError> {
        let payload = &job.payload;

        // Resolve
        let listing_url =
            metadata_url(&payload.reddit_post_url).map_err(PipelineError::metadata)?;
        logger.log_progress(&format!("Fetching listing {}", listing_url));

        let listing = self
            .fetcher
            .fetch_json(&listing_url)
            .await
            .map_err(PipelineError::metadata)?;
        let video_url = extract_video_url(&listing).map_err(PipelineError::metadata)?;
        let audio_url = derive_audio_url(&video_url).map_err(PipelineError::pattern)?;

        // Download
        let video_path = workspace.video_path();
        let audio_path = workspace.audio_path();

        logger.log_progress(&format!("Downloading video {}", video_url));
        let video_bytes = self
            .fetcher
            .download(&video_url, &video_path)
            .await
            .map_err(PipelineError::download)?;

        logger.log_progress(&format!("Downloading audio {}", audio_url));
        let audio_bytes = self
            .fetcher
            .download(&audio_url, &audio_path)
            .await
            .map_err(PipelineError::download)?;
        record_download_bytes(video_bytes + audio_bytes);

        // Mux
        let file_name = payload.output_file_name();
        let output_path = workspace.output_path(&file_name);
        self.muxer
            .mux(&video_path, &audio_path, &output_path)
            .await
            .map_err(PipelineError::mux)?;

        // Upload
        let folder = self
            .allocator
            .allocate(&self.config.base_prefix)
            .await
            .map_err(PipelineError::upload)?;
        let key = format!("{}/{}", folder, file_name);

        logger.log_progress(&format!("Uploading to {}", key));
        self.store
            .put_file(&output_path, &key, "video/mp4")
            .await
            .map_err(PipelineError::upload)?;

        if self.config.upload_metadata {
            let body = serde_json::to_vec_pretty(&listing).map_err(PipelineError::upload)?;
            self.store
                .put_bytes(
                    body,
                    &format!("{}/{}", folder, METADATA_FILE_NAME),
                    "application/json",
                )
                .await
                .map_err(PipelineError::upload)?;
        }

        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeMuxer, FakeStore, TestEnv};
    use vsave_models::{JobId, JobPayload};

    fn job(id: i64, post: &str, name: &str) -> JobRef {
        JobRef::new(JobId(id), JobPayload::new(post, name))
    }

    fn logger() -> JobLogger {
        JobLogger::new(JobId(0), "test")
    }

    #[tokio::test]
    async fn test_successful_run_uploads_muxed_file() {
        let env = TestEnv::new();
        env.fetcher.add_post("https://x/post1", "https://v.redd.it/abc/DASH_720.mp4");

        let key = env
            .pipeline()
            .run(&job(1, "https://x/post1", "clip1"), &logger())
            .await
            .unwrap();

        assert!(key.starts_with("videos/"));
        assert!(key.ends_with("/clip1.mp4"));
        assert_eq!(
            env.store.object(&key).unwrap(),
            b"video:https://v.redd.it/abc/DASH_720.mp4|audio:https://v.redd.it/abc/DASH_AUDIO_128.mp4"
        );
        assert_eq!(env.store.keys().len(), 1);
        assert!(env.work_dir_is_empty());
    }

    #[tokio::test]
    async fn test_output_named_like_a_download_still_muxes() {
        let env = TestEnv::new();
        env.fetcher.add_post("https://x/post1", "https://v.redd.it/abc/DASH_720.mp4");

        for (id, name) in [(10, "video"), (11, "audio")] {
            let key = env
                .pipeline()
                .run(&job(id, "https://x/post1", name), &logger())
                .await
                .unwrap();

            assert!(key.ends_with(&format!("/{name}.mp4")));
            assert_eq!(
                env.store.object(&key).unwrap(),
                b"video:https://v.redd.it/abc/DASH_720.mp4|audio:https://v.redd.it/abc/DASH_AUDIO_128.mp4"
            );
        }
        assert!(env.work_dir_is_empty());
    }

    #[tokio::test]
    async fn test_metadata_uploaded_next_to_video_when_enabled() {
        let env = TestEnv::new();
        env.fetcher.add_post("https://x/post1", "https://v.redd.it/abc/DASH_720.mp4");
        let mut config = env.config();
        config.upload_metadata = true;

        let key = env
            .pipeline_with(config)
            .run(&job(1, "https://x/post1", "clip1"), &logger())
            .await
            .unwrap();

        let folder = key.rsplit_once('/').unwrap().0;
        let listing = env.store.object(&format!("{folder}/{METADATA_FILE_NAME}")).unwrap();
        let listing: serde_json::Value = serde_json::from_slice(&listing).unwrap();
        assert!(listing.pointer(vsave_media::VIDEO_URL_POINTER).is_some());
    }

    #[tokio::test]
    async fn test_missing_video_path_is_metadata_error() {
        let env = TestEnv::new();
        env.fetcher
            .add_listing("https://x/text-post.json", serde_json::json!([{ "data": {} }]));

        let err = env
            .pipeline()
            .run(&job(2, "https://x/text-post", "clip"), &logger())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Metadata(_)));
        assert!(err.to_string().starts_with("Metadata error"));
        assert!(env.fetcher.downloads().is_empty());
        assert!(env.work_dir_is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_listing_is_metadata_error() {
        let env = TestEnv::new();

        let err = env
            .pipeline()
            .run(&job(3, "https://x/gone", "clip"), &logger())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Metadata(_)));
    }

    #[tokio::test]
    async fn test_non_reddit_video_url_is_pattern_error() {
        let env = TestEnv::new();
        env.fetcher.add_post("https://x/post1", "https://cdn.example.com/video.mp4");

        let err = env
            .pipeline()
            .run(&job(4, "https://x/post1", "clip"), &logger())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Pattern(_)));
        assert!(env.work_dir_is_empty());
    }

    #[tokio::test]
    async fn test_missing_audio_stream_is_download_error() {
        let env = TestEnv::new();
        env.fetcher.add_listing(
            "https://x/post1.json",
            crate::test_support::listing("https://v.redd.it/abc/DASH_720.mp4"),
        );
        env.fetcher
            .add_body("https://v.redd.it/abc/DASH_720.mp4", b"video".to_vec());

        let err = env
            .pipeline()
            .run(&job(5, "https://x/post1", "clip"), &logger())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Download(_)));
        assert!(env.store.keys().is_empty());
        assert!(env.work_dir_is_empty());
    }

    #[tokio::test]
    async fn test_mux_failure_uploads_nothing() {
        let env = TestEnv::new();
        env.fetcher.add_post("https://x/post1", "https://v.redd.it/abc/DASH_720.mp4");
        let pipeline = Pipeline::new(
            env.config(),
            env.fetcher.clone(),
            Arc::new(FakeMuxer::failing()),
            env.store.clone(),
        );

        let err = pipeline
            .run(&job(6, "https://x/post1", "clip"), &logger())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Mux(_)));
        assert!(env.store.keys().is_empty());
        assert!(env.work_dir_is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_is_upload_error() {
        let env = TestEnv::new();
        env.fetcher.add_post("https://x/post1", "https://v.redd.it/abc/DASH_720.mp4");
        let pipeline = Pipeline::new(
            env.config(),
            env.fetcher.clone(),
            Arc::new(FakeMuxer::default()),
            Arc::new(FakeStore::read_only()),
        );

        let err = pipeline
            .run(&job(7, "https://x/post1", "clip"), &logger())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Upload(_)));
        assert!(env.work_dir_is_empty());
    }

    #[test]
    fn test_success_message_names_key() {
        assert_eq!(
            success_message("videos/20240601-000000-abcd1234/clip1.mp4"),
            "Video processed and saved to S3 at videos/20240601-000000-abcd1234/clip1.mp4"
        );
    }
}
