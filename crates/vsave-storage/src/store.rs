//! Object store abstraction used by the pipeline.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Key-addressed blob storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// All keys starting with `prefix`.
    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Whether at least one key starts with `prefix`.
    async fn has_objects(&self, prefix: &str) -> StorageResult<bool> {
        Ok(!self.list_keys(prefix).await?.is_empty())
    }

    /// Upload a local file to `key`.
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    /// Upload an in-memory buffer to `key`.
    async fn put_bytes(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<()>;

    /// Check that the store is reachable.
    async fn check_connectivity(&self) -> StorageResult<()>;
}
