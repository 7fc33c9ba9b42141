// src/media/mod.rs
//! Decides whether an item gets an illustration and fetches it.
//!
//! An image is requested only for titles hitting a trigger keyword while the
//! daily quota has room. Image failures are swallowed; text publishing never
//! waits on them.

pub mod quota;

use chrono::NaiveDate;
use metrics::counter;

use crate::ai::DynImageGenerator;
use crate::error::{with_timeout, BotError};
use crate::feed::types::ContentItem;
pub use quota::MediaQuota;

pub const DEFAULT_KEYWORDS: [&str; 8] = [
    "explosion",
    "attack",
    "earthquake",
    "blast",
    "flood",
    "fire",
    "crash",
    "strike",
];

/// Raw image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub source_url: Option<String>,
}

pub struct MediaPolicy {
    enabled: bool,
    keywords: Vec<String>,
    quota: MediaQuota,
    generator: DynImageGenerator,
    timeout_secs: u64,
}

impl MediaPolicy {
    pub fn new(
        enabled: bool,
        keywords: Vec<String>,
        quota: MediaQuota,
        generator: DynImageGenerator,
        timeout_secs: u64,
    ) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            enabled,
            keywords,
            quota,
            generator,
            timeout_secs,
        }
    }

    /// First trigger keyword contained in `title` (case-insensitive).
    pub fn matched_keyword(&self, title: &str) -> Option<&str> {
        let lower = title.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn should_attach_image(&mut self, item: &ContentItem, today: NaiveDate) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(kw) = self.matched_keyword(&item.title).map(str::to_string) else {
            return false;
        };
        if !self.quota.has_capacity(today) {
            let reason = BotError::ImageQuotaExhausted {
                used: self.quota.used(),
                ceiling: self.quota.ceiling(),
            };
            tracing::info!(target: "pipeline", keyword = %kw, reason = %reason, "image skipped");
            return false;
        }
        tracing::debug!(target: "pipeline", keyword = %kw, "image requested");
        true
    }

    /// One generation attempt. Quota only moves on success.
    pub async fn generate_image(&mut self, prompt_seed: &str, today: NaiveDate) -> Option<MediaAsset> {
        if !self.quota.has_capacity(today) {
            return None;
        }
        let prompt = image_prompt(prompt_seed);
        match with_timeout(
            "image generation",
            self.timeout_secs,
            self.generator.generate_image(&prompt),
        )
        .await
        {
            Ok(asset) if !asset.bytes.is_empty() => {
                self.quota.record_success(today);
                counter!("bot_images_generated_total").increment(1);
                tracing::info!(
                    target: "pipeline",
                    used = self.quota.used(),
                    ceiling = self.quota.ceiling(),
                    "image generated"
                );
                Some(asset)
            }
            Ok(_) => {
                tracing::warn!(target: "pipeline", error = %BotError::ImageGenerationFailed("empty result".into()), "image dropped");
                None
            }
            Err(e) => {
                tracing::warn!(target: "pipeline", error = %e, kind = e.kind(), "image dropped");
                None
            }
        }
    }

    pub fn quota(&self) -> &MediaQuota {
        &self.quota
    }
}

/// Image prompt for a headline; asks for no rendered text.
pub fn image_prompt(title: &str) -> String {
    format!("Editorial news illustration, no text or logos: {}", title.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::DisabledGenerator;
    use std::sync::Arc;

    fn policy(ceiling: u32) -> MediaPolicy {
        let today = NaiveDate::from_ymd_opt(2025, 9, 6).unwrap();
        MediaPolicy::new(
            true,
            DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            MediaQuota::in_memory(ceiling, today),
            Arc::new(DisabledGenerator),
            5,
        )
    }

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        let p = policy(3);
        assert_eq!(p.matched_keyword("Wildfires spread north"), Some("fire"));
        assert_eq!(p.matched_keyword("ATTACK on convoy"), Some("attack"));
        assert_eq!(p.matched_keyword("Markets close flat"), None);
    }

    #[tokio::test]
    async fn failed_generation_leaves_quota_untouched() {
        let mut p = policy(3);
        let today = NaiveDate::from_ymd_opt(2025, 9, 6).unwrap();
        assert!(p.generate_image("Flood warning", today).await.is_none());
        assert_eq!(p.quota().used(), 0);
    }
}
