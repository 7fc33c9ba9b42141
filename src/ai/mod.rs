//! Generation collaborators: text (post copy) and image (illustration).
//!
//! The pipeline only sees the two traits below; `openai` provides the real
//! remote implementation and `DisabledGenerator` routes every request to the
//! caller's fallback.

pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{BotError, Result};
use crate::media::MediaAsset;

/// One text-generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    /// Role/instruction text.
    pub system: String,
    /// Item-specific content.
    pub user: String,
    pub max_tokens: u32,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &PromptSpec) -> Result<String>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image for `prompt` and return its bytes.
    async fn generate_image(&self, prompt: &str) -> Result<MediaAsset>;
    fn provider_name(&self) -> &'static str;
}

pub type DynTextGenerator = Arc<dyn TextGenerator>;
pub type DynImageGenerator = Arc<dyn ImageGenerator>;

/// Always fails; used when generation is turned off in config.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate_text(&self, _prompt: &PromptSpec) -> Result<String> {
        Err(BotError::GenerationFailed("generation disabled".into()))
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

#[async_trait]
impl ImageGenerator for DisabledGenerator {
    async fn generate_image(&self, _prompt: &str) -> Result<MediaAsset> {
        Err(BotError::ImageGenerationFailed("generation disabled".into()))
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}
