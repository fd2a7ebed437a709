//! HTTP fetcher for metadata documents and media streams.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Browser-like identification. Reddit throttles unknown agents hard.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Remote content source used by the pipeline.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// GET `url` and parse the body as JSON.
    async fn fetch_json(&self, url: &str) -> MediaResult<serde_json::Value>;

    /// GET `url` and stream the body into `dest`. Returns bytes written.
    async fn download(&self, url: &str, dest: &Path) -> MediaResult<u64>;
}

/// reqwest-backed [`MediaFetcher`].
///
/// Every request carries the configured User-Agent. Only a connect timeout
/// is applied; large media bodies are allowed to take as long as they need.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> MediaResult<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(15))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| MediaError::request_failed("<client>", e.to_string()))?;

        Ok(Self { http })
    }

    async fn get(&self, url: &str) -> MediaResult<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::request_failed(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::request_failed(url, format!("HTTP {}", status)));
        }

        Ok(response)
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> MediaResult<serde_json::Value> {
        debug!(url = %url, "Fetching JSON document");

        let body = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| MediaError::request_failed(url, e.to_string()))?;

        Ok(serde_json::from_slice(&body)?)
    }

    async fn download(&self, url: &str, dest: &Path) -> MediaResult<u64> {
        let response = self
            .get(url)
            .await
            .map_err(|e| MediaError::download_failed(e.to_string()))?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                MediaError::download_failed(format!("{} after {} bytes: {}", url, written, e))
            })?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(url = %url, bytes = written, path = %dest.display(), "Download complete");
        Ok(written)
    }
}
