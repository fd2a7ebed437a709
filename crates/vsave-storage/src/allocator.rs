//! Destination folder allocation.
//!
//! Each upload lands in its own folder named
//! `<base>/<YYYYMMDD-HHMMSS>-<suffix>`. A candidate is accepted only if the
//! store holds nothing under it. The check and the later upload are not
//! atomic; that is safe while the pipeline is the only writer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;

/// Attempts before giving up on finding a free folder.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Length of the random folder suffix.
pub const SUFFIX_LEN: usize = 8;

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Picks unused destination folders in an [`ObjectStore`].
#[derive(Clone)]
pub struct FolderAllocator {
    store: Arc<dyn ObjectStore>,
    max_attempts: u32,
}

impl FolderAllocator {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Return a folder key under `base_prefix` with no objects beneath it.
    ///
    /// The returned key has no trailing slash.
    pub async fn allocate(&self, base_prefix: &str) -> StorageResult<String> {
        for attempt in 1..=self.max_attempts {
            let candidate = candidate_key(base_prefix, Utc::now());
            let probe = format!("{}/", candidate);

            if !self.store.has_objects(&probe).await? {
                debug!(key = %candidate, attempt, "Allocated destination folder");
                return Ok(candidate);
            }

            warn!(key = %candidate, attempt, "Destination folder already in use, retrying");
        }

        Err(StorageError::AllocationExhausted {
            prefix: base_prefix.to_string(),
            attempts: self.max_attempts,
        })
    }
}

/// Build one candidate key. Kept synchronous so the thread-local RNG never
/// lives across an await point.
fn candidate_key(base_prefix: &str, now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();

    let folder = format!("{}-{}", now.format("%Y%m%d-%H%M%S"), suffix);
    let base = base_prefix.trim_matches('/');

    if base.is_empty() {
        folder
    } else {
        format!("{}/{}", base, folder)
    }
}
