// src/error.rs
//! Failure kinds of the publish pipeline.
//!
//! Collaborators (feeds, generators, posting clients, state files) report one of
//! these; the component that called them turns it into a "no usable result"
//! signal. Only `Misconfigured` is allowed to stop the process, and only at startup.

use thiserror::Error;

pub type Result<T, E = BotError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("feed `{partition}` unavailable: {reason}")]
    FeedUnavailable { partition: String, reason: String },

    #[error("malformed item: {0}")]
    MalformedItem(String),

    #[error("text generation failed: {0}")]
    GenerationFailed(String),

    #[error("text generation returned an empty result")]
    GenerationEmpty,

    #[error("image quota exhausted ({used}/{ceiling})")]
    ImageQuotaExhausted { used: u32, ceiling: u32 },

    #[error("image generation failed: {0}")]
    ImageGenerationFailed(String),

    #[error("media upload failed: {0}")]
    MediaUploadFailed(String),

    #[error("post rejected{}: {reason}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    PublishRejected { status: Option<u16>, reason: String },

    #[error("state `{path}` unavailable: {reason}")]
    PersistenceUnavailable { path: String, reason: String },

    #[error("{op} timed out after {secs}s")]
    Timeout { op: &'static str, secs: u64 },

    #[error("misconfigured: {0}")]
    Misconfigured(String),
}

impl BotError {
    /// Short, stable label for metrics and status output.
    pub fn kind(&self) -> &'static str {
        match self {
            BotError::FeedUnavailable { .. } => "feed_unavailable",
            BotError::MalformedItem(_) => "malformed_item",
            BotError::GenerationFailed(_) => "generation_failed",
            BotError::GenerationEmpty => "generation_empty",
            BotError::ImageQuotaExhausted { .. } => "image_quota_exhausted",
            BotError::ImageGenerationFailed(_) => "image_generation_failed",
            BotError::MediaUploadFailed(_) => "media_upload_failed",
            BotError::PublishRejected { .. } => "publish_rejected",
            BotError::PersistenceUnavailable { .. } => "persistence_unavailable",
            BotError::Timeout { .. } => "timeout",
            BotError::Misconfigured(_) => "misconfigured",
        }
    }

    /// Whether a posting client may retry the call that produced this error.
    pub fn is_transient(&self) -> bool {
        match self {
            BotError::Timeout { .. } => true,
            BotError::PublishRejected { status, .. } => match status {
                None => true,
                Some(s) => *s == 429 || *s >= 500,
            },
            _ => false,
        }
    }
}

/// Run `fut` bounded by `secs`; elapsed time becomes `BotError::Timeout`.
pub async fn with_timeout<T, F>(op: &'static str, secs: u64, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(std::time::Duration::from_secs(secs), fut).await {
        Ok(res) => res,
        Err(_) => Err(BotError::Timeout { op, secs }),
    }
}
