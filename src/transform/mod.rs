// src/transform/mod.rs
//! Turns a content item into post text.
//!
//! Strategies are tried in order and the first non-empty result wins; the
//! canonical `"<title>\n\n<url>"` rendering always succeeds for a titled item,
//! so generation outages never stall the pipeline. Every result is trimmed,
//! decorated, then fitted to the platform limit.

pub mod decorate;

use async_trait::async_trait;
use metrics::counter;

use crate::ai::{DynTextGenerator, PromptSpec};
use crate::error::{with_timeout, BotError, Result};
use crate::feed::types::ContentItem;
pub use decorate::Decoration;

pub const DEFAULT_MAX_CHARS: usize = 280;
pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageOrigin {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMessage {
    pub text: String,
    pub origin: MessageOrigin,
}

#[async_trait]
pub trait MessageStrategy: Send + Sync {
    async fn render(&self, item: &ContentItem) -> Result<String>;
    fn origin(&self) -> MessageOrigin;
    fn name(&self) -> &'static str;
}

/// Asks the text generator for a summary of the item.
pub struct GenerativeStrategy {
    generator: DynTextGenerator,
    instruction: String,
    max_tokens: u32,
    timeout_secs: u64,
}

impl GenerativeStrategy {
    pub fn new(generator: DynTextGenerator, instruction: String, max_tokens: u32, timeout_secs: u64) -> Self {
        Self {
            generator,
            instruction,
            max_tokens,
            timeout_secs,
        }
    }

    pub fn build_prompt(&self, item: &ContentItem) -> PromptSpec {
        let user = match item.description_text() {
            Some(d) => format!("{}\n{}", item.title.trim(), d),
            None => item.title.trim().to_string(),
        };
        PromptSpec {
            system: self.instruction.clone(),
            user,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl MessageStrategy for GenerativeStrategy {
    async fn render(&self, item: &ContentItem) -> Result<String> {
        let prompt = self.build_prompt(item);
        let text = with_timeout(
            "text generation",
            self.timeout_secs,
            self.generator.generate_text(&prompt),
        )
        .await?;
        if text.trim().is_empty() {
            return Err(BotError::GenerationEmpty);
        }
        Ok(text)
    }

    fn origin(&self) -> MessageOrigin {
        MessageOrigin::Generated
    }

    fn name(&self) -> &'static str {
        "generative"
    }
}

/// `"<title>\n\n<url>"`, or the title alone when there is no link.
pub struct CanonicalStrategy;

pub fn canonical_text(item: &ContentItem) -> String {
    let title = item.title.trim();
    match item.link() {
        Some(link) => format!("{title}\n\n{link}"),
        None => title.to_string(),
    }
}

#[async_trait]
impl MessageStrategy for CanonicalStrategy {
    async fn render(&self, item: &ContentItem) -> Result<String> {
        if item.title.trim().is_empty() {
            return Err(BotError::MalformedItem(format!("missing title for {}", item.id)));
        }
        Ok(canonical_text(item))
    }

    fn origin(&self) -> MessageOrigin {
        MessageOrigin::Fallback
    }

    fn name(&self) -> &'static str {
        "canonical"
    }
}

/// Truncate to `limit` chars, ending in `"..."` when anything was cut.
pub fn fit_to_limit(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(&ELLIPSIS[..limit.min(ELLIPSIS.len())]);
    out
}

pub struct Transformer {
    strategies: Vec<Box<dyn MessageStrategy>>,
    decoration: Decoration,
    max_chars: usize,
}

impl Transformer {
    /// The standard chain: generator first, canonical rendering second.
    pub fn new(
        generator: DynTextGenerator,
        instruction: String,
        max_tokens: u32,
        timeout_secs: u64,
        decoration: Decoration,
        max_chars: usize,
    ) -> Self {
        Self::with_strategies(
            vec![
                Box::new(GenerativeStrategy::new(generator, instruction, max_tokens, timeout_secs)),
                Box::new(CanonicalStrategy),
            ],
            decoration,
            max_chars,
        )
    }

    pub fn with_strategies(
        strategies: Vec<Box<dyn MessageStrategy>>,
        decoration: Decoration,
        max_chars: usize,
    ) -> Self {
        Self {
            strategies,
            decoration,
            max_chars,
        }
    }

    pub async fn transform(&self, item: &ContentItem) -> GeneratedMessage {
        for strategy in &self.strategies {
            match strategy.render(item).await {
                Ok(text) if !text.trim().is_empty() => {
                    return self.finish(&text, strategy.origin());
                }
                Ok(_) => {
                    tracing::warn!(target: "pipeline", strategy = strategy.name(), error = %BotError::GenerationEmpty, "strategy produced nothing");
                }
                Err(e) => {
                    tracing::warn!(target: "pipeline", strategy = strategy.name(), error = %e, kind = e.kind(), "strategy failed");
                }
            }
        }
        // Only reachable with a chain lacking the canonical step.
        self.finish(&canonical_text(item), MessageOrigin::Fallback)
    }

    fn finish(&self, raw: &str, origin: MessageOrigin) -> GeneratedMessage {
        if origin == MessageOrigin::Fallback {
            counter!("bot_generation_fallback_total").increment(1);
        }
        let decorated = self.decoration.decorate(raw.trim());
        GeneratedMessage {
            text: fit_to_limit(&decorated, self.max_chars),
            origin,
        }
    }
}
