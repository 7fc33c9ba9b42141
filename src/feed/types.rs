// src/feed/types.rs
use crate::error::{BotError, Result};

/// One candidate item as delivered by a feed partition. Immutable once fetched.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,                // stable URL (or guid), the dedupe key
    /// Publishable link; only ever a real URL, never a guid.
    #[serde(default)]
    pub link: Option<String>,
    pub title: String,             // empty means "missing"
    pub description: Option<String>,
    pub published_at: Option<u64>, // unix seconds
    pub body: Option<String>,
    pub partition: String,         // e.g. "newsapi:in", "rss:example.org"
}

impl ContentItem {
    /// Item with the minimum fields; everything optional left empty.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            link: None,
            title: title.into(),
            description: None,
            published_at: None,
            body: None,
            partition: String::new(),
        }
    }

    pub fn with_description(mut self, d: impl Into<String>) -> Self {
        self.description = Some(d.into());
        self
    }

    pub fn with_partition(mut self, p: impl Into<String>) -> Self {
        self.partition = p.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Non-blank link published alongside fallback text.
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }

    /// Non-blank description, if any.
    pub fn description_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Items without an id or title are skipped by the orchestrator.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(BotError::MalformedItem("missing id".into()));
        }
        if self.title.trim().is_empty() {
            return Err(BotError::MalformedItem(format!("missing title for {}", self.id)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<ContentItem>>;
    /// Partition label used in logs and metrics.
    fn name(&self) -> &str;
}
