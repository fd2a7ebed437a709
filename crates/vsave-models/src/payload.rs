//! Submission payloads.
//!
//! The ledger stores whatever JSON document the caller submitted. This
//! module provides the typed view the pipeline needs: the source post URL
//! and the output name. Unknown fields are ignored here and survive in the
//! stored document.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use validator::{Validate, ValidationError};

/// Maximum length of an output name (without extension).
pub const MAX_OUTPUT_NAME_LEN: u64 = 128;

/// Errors raised while turning a submitted document into a [`JobPayload`].
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid payload: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Typed view of a job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct JobPayload {
    /// Reddit post the video belongs to
    #[serde(alias = "postRef", alias = "post_url")]
    #[validate(custom(function = "validate_post_url"))]
    pub reddit_post_url: String,

    /// Object name of the muxed file, without the `.mp4` extension
    #[serde(alias = "outputName")]
    #[validate(
        length(min = 1, max = 128),
        custom(function = "validate_output_name")
    )]
    pub output_name: String,
}

impl JobPayload {
    pub fn new(reddit_post_url: impl Into<String>, output_name: impl Into<String>) -> Self {
        Self {
            reddit_post_url: reddit_post_url.into(),
            output_name: output_name.into(),
        }
    }

    /// Parse and validate a submitted document.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, PayloadError> {
        if !value.is_object() {
            return Err(PayloadError::NotAnObject);
        }

        let payload: JobPayload = serde_json::from_value(value.clone())?;
        payload.validate()?;
        Ok(payload)
    }

    /// File name of the muxed output.
    pub fn output_file_name(&self) -> String {
        format!("{}.mp4", self.output_name)
    }
}

fn validate_post_url(value: &str) -> Result<(), ValidationError> {
    let url = Url::parse(value).map_err(|_| ValidationError::new("invalid_url"))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(()),
        _ => Err(ValidationError::new("unsupported_url")),
    }
}

fn validate_output_name(value: &str) -> Result<(), ValidationError> {
    if value.starts_with('.') {
        return Err(ValidationError::new("leading_dot"));
    }

    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_output_name"))
    }
}
