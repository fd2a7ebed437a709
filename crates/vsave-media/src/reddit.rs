//! Reddit post resolution.
//!
//! A post's JSON listing is at the post URL with `.json` appended to the
//! path. The hosted video lives at a fixed nested location in that listing,
//! and the matching audio-only stream shares the video's path with a
//! different quality segment.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{MediaError, MediaResult};

/// JSON pointer to the video-only stream inside a post listing.
pub const VIDEO_URL_POINTER: &str =
    "/0/data/children/0/data/secure_media/reddit_video/fallback_url";

/// Quality segment of the audio-only companion stream.
const AUDIO_SEGMENT: &str = "DASH_AUDIO_128";

static VIDEO_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(v\.redd\.it/\w+/)(\w+)(\.mp4)").unwrap());

/// Build the listing URL for a post.
///
/// The query string is preserved and any fragment is dropped.
pub fn metadata_url(post_url: &str) -> MediaResult<String> {
    let mut url = Url::parse(post_url).map_err(|e| MediaError::InvalidUrl(e.to_string()))?;

    let listing_path = format!("{}.json", url.path());
    url.set_path(&listing_path);
    url.set_fragment(None);

    Ok(url.to_string())
}

/// Pull the video stream URL out of a post listing.
pub fn extract_video_url(listing: &serde_json::Value) -> MediaResult<String> {
    listing
        .pointer(VIDEO_URL_POINTER)
        .and_then(serde_json::Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            MediaError::metadata_missing(format!("no video URL at {}", VIDEO_URL_POINTER))
        })
}

/// Derive the audio stream URL from a video stream URL.
///
/// `https://v.redd.it/abc123/DASH_720.mp4?source=fallback` becomes
/// `https://v.redd.it/abc123/DASH_AUDIO_128.mp4?source=fallback`.
pub fn derive_audio_url(video_url: &str) -> MediaResult<String> {
    if !VIDEO_SEGMENT.is_match(video_url) {
        return Err(MediaError::pattern_mismatch(video_url));
    }

    let replacement = format!("${{1}}{}${{3}}", AUDIO_SEGMENT);
    Ok(VIDEO_SEGMENT.replace_all(video_url, replacement.as_str()).into_owned())
}
