//! In-memory fakes for the pipeline's collaborators.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use vsave_media::{derive_audio_url, MediaError, MediaFetcher, MediaResult, Muxer};
use vsave_storage::{ObjectStore, StorageError, StorageResult};

use crate::config::WorkerConfig;
use crate::pipeline::Pipeline;

/// A post listing whose video lives at `video_url`.
pub(crate) fn listing(video_url: &str) -> Value {
    json!([{
        "kind": "Listing",
        "data": { "children": [{ "data": {
            "secure_media": { "reddit_video": { "fallback_url": video_url } }
        }}]}
    }])
}

#[derive(Default)]
pub(crate) struct FakeFetcher {
    listings: Mutex<HashMap<String, Value>>,
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    fetched: Mutex<Vec<String>>,
    downloaded: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub(crate) fn add_listing(&self, url: &str, listing: Value) {
        self.listings.lock().unwrap().insert(url.to_string(), listing);
    }

    pub(crate) fn add_body(&self, url: &str, body: Vec<u8>) {
        self.bodies.lock().unwrap().insert(url.to_string(), body);
    }

    /// Register a post with downloadable video and audio streams.
    pub(crate) fn add_post(&self, post_url: &str, video_url: &str) {
        self.add_listing(&format!("{post_url}.json"), listing(video_url));
        self.add_body(video_url, format!("video:{video_url}").into_bytes());
        if let Ok(audio_url) = derive_audio_url(video_url) {
            self.add_body(&audio_url, format!("audio:{audio_url}").into_bytes());
        }
    }

    pub(crate) fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub(crate) fn downloads(&self) -> Vec<String> {
        self.downloaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch_json(&self, url: &str) -> MediaResult<Value> {
        self.fetched.lock().unwrap().push(url.to_string());
        let listing = self.listings.lock().unwrap().get(url).cloned();
        listing.ok_or_else(|| MediaError::request_failed(url, "HTTP 404 Not Found"))
    }

    async fn download(&self, url: &str, dest: &Path) -> MediaResult<u64> {
        self.downloaded.lock().unwrap().push(url.to_string());
        let body = self.bodies.lock().unwrap().get(url).cloned();
        let body = body.ok_or_else(|| MediaError::download_failed(format!("{url}: HTTP 404")))?;
        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }
}

/// Joins video and audio bytes with `|` instead of running FFmpeg.
/// Like FFmpeg, it fails when the output path is one of the inputs.
#[derive(Default)]
pub(crate) struct FakeMuxer {
    fail: bool,
}

impl FakeMuxer {
    pub(crate) fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl Muxer for FakeMuxer {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
        if self.fail {
            return Err(MediaError::ffmpeg_failed(
                "Could not find tag for codec",
                None,
                Some(1),
            ));
        }
        // FFmpeg refuses to overwrite one of its own inputs, even with -y.
        if output == video || output == audio {
            return Err(MediaError::ffmpeg_failed(
                "Output same as Input - exiting",
                None,
                Some(1),
            ));
        }
        let mut joined = tokio::fs::read(video).await?;
        joined.push(b'|');
        joined.extend(tokio::fs::read(audio).await?);
        tokio::fs::write(output, joined).await?;
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    read_only: bool,
}

impl FakeStore {
    pub(crate) fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub(crate) fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    fn insert(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        if self.read_only {
            return Err(StorageError::upload_failed("AccessDenied"));
        }
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn put_file(&self, path: &Path, key: &str, _content_type: &str) -> StorageResult<()> {
        let data = tokio::fs::read(path).await?;
        self.insert(key, data)
    }

    async fn put_bytes(&self, data: Vec<u8>, key: &str, _content_type: &str) -> StorageResult<()> {
        self.insert(key, data)
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Scratch root plus shared fakes.
pub(crate) struct TestEnv {
    root: TempDir,
    pub(crate) fetcher: Arc<FakeFetcher>,
    pub(crate) store: Arc<FakeStore>,
}

impl TestEnv {
    pub(crate) fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
            fetcher: Arc::new(FakeFetcher::default()),
            store: Arc::new(FakeStore::default()),
        }
    }

    pub(crate) fn work_dir(&self) -> PathBuf {
        self.root.path().join("work")
    }

    pub(crate) fn config(&self) -> WorkerConfig {
        WorkerConfig {
            work_dir: self.work_dir(),
            ..WorkerConfig::default()
        }
    }

    pub(crate) fn pipeline(&self) -> Pipeline {
        self.pipeline_with(self.config())
    }

    pub(crate) fn pipeline_with(&self, config: WorkerConfig) -> Pipeline {
        Pipeline::new(
            config,
            self.fetcher.clone(),
            Arc::new(FakeMuxer::default()),
            self.store.clone(),
        )
    }

    /// True when no job left anything behind in the scratch root.
    pub(crate) fn work_dir_is_empty(&self) -> bool {
        match std::fs::read_dir(self.work_dir()) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }
}
