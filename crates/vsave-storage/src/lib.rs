//! S3 object storage.
//!
//! This crate provides:
//! - File and byte uploads to an S3 bucket (AWS or any S3-compatible store)
//! - Prefix listing with pagination
//! - The [`ObjectStore`] seam the pipeline is written against
//! - Collision-free destination folder allocation

pub mod allocator;
pub mod client;
pub mod error;
pub mod store;

pub use allocator::{FolderAllocator, DEFAULT_MAX_ATTEMPTS, SUFFIX_LEN};
pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use store::ObjectStore;
