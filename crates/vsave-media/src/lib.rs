//! Media side of the pipeline.
//!
//! This crate provides:
//! - Reddit metadata URL building and media URL extraction
//! - An HTTP fetcher for JSON documents and streamed downloads
//! - Type-safe FFmpeg command building for the video/audio mux
//! - Per-job scratch directories that clean up after themselves

pub mod command;
pub mod error;
pub mod fetch;
pub mod mux;
pub mod reddit;
pub mod workspace;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fetch::{HttpFetcher, MediaFetcher, DEFAULT_USER_AGENT};
pub use mux::{FfmpegMuxer, Muxer};
pub use reddit::{derive_audio_url, extract_video_url, metadata_url, VIDEO_URL_POINTER};
pub use workspace::JobWorkspace;
