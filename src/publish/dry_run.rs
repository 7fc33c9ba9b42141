// src/publish/dry_run.rs
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

use super::PostingClient;
use crate::error::Result;
use crate::media::MediaAsset;

/// Logs instead of posting. Every call succeeds with a synthetic id.
#[derive(Debug, Default)]
pub struct DryRunPoster {
    seq: AtomicU64,
}

impl DryRunPoster {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.seq.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[async_trait]
impl PostingClient for DryRunPoster {
    async fn upload_media(&self, asset: &MediaAsset) -> Result<String> {
        tracing::info!(target: "dry_run", bytes = asset.bytes.len(), mime = %asset.mime, "would upload media");
        Ok(self.next_id("dry-media"))
    }

    async fn submit_post(&self, text: &str, media_id: Option<&str>) -> Result<String> {
        tracing::info!(target: "dry_run", chars = text.chars().count(), media = ?media_id, "would post:\n{text}");
        Ok(self.next_id("dry-post"))
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
