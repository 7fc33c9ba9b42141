// src/publish/mod.rs
//! Sends the final text, optionally with one image, to the posting service.

pub mod dry_run;
pub mod x;

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;

use crate::error::{with_timeout, BotError, Result};
use crate::media::MediaAsset;

#[async_trait]
pub trait PostingClient: Send + Sync {
    /// Upload raw bytes; returns the service's media handle.
    async fn upload_media(&self, asset: &MediaAsset) -> Result<String>;
    /// Create a post; returns its id.
    async fn submit_post(&self, text: &str, media_id: Option<&str>) -> Result<String>;
    fn name(&self) -> &'static str;
}

pub type DynPostingClient = Arc<dyn PostingClient>;

/// Outcome of one publish attempt. Logged, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PublishResult {
    pub success: bool,
    pub post_id: Option<String>,
    pub error_reason: Option<String>,
    pub media_attached: bool,
}

impl PublishResult {
    fn posted(post_id: String, media_attached: bool) -> Self {
        Self {
            success: true,
            post_id: Some(post_id),
            error_reason: None,
            media_attached,
        }
    }

    fn failed(reason: String) -> Self {
        Self {
            success: false,
            post_id: None,
            error_reason: Some(reason),
            media_attached: false,
        }
    }
}

pub struct Publisher {
    client: DynPostingClient,
    timeout_secs: u64,
}

impl Publisher {
    /// `timeout_secs` bounds each client call including its internal retries.
    pub fn new(client: DynPostingClient, timeout_secs: u64) -> Self {
        Self { client, timeout_secs }
    }

    pub fn client_name(&self) -> &'static str {
        self.client.name()
    }

    pub async fn publish(&self, message: &str, media: Option<&MediaAsset>) -> PublishResult {
        let mut media_id = None;
        if let Some(asset) = media {
            match with_timeout("media upload", self.timeout_secs, self.client.upload_media(asset)).await {
                Ok(id) => media_id = Some(id),
                Err(e) => {
                    // lose the image, keep the message
                    let e = match e {
                        BotError::MediaUploadFailed(_) => e,
                        other => BotError::MediaUploadFailed(other.to_string()),
                    };
                    tracing::warn!(target: "pipeline", error = %e, "posting text-only");
                }
            }
        }

        match with_timeout(
            "post submit",
            self.timeout_secs,
            self.client.submit_post(message, media_id.as_deref()),
        )
        .await
        {
            Ok(post_id) => {
                counter!("bot_publish_total").increment(1);
                PublishResult::posted(post_id, media_id.is_some())
            }
            Err(e) => {
                counter!("bot_publish_failures_total").increment(1);
                tracing::warn!(target: "pipeline", error = %e, kind = e.kind(), client = self.client.name(), "submit failed");
                PublishResult::failed(e.to_string())
            }
        }
    }
}
