// tests/common/mod.rs
//
// In-process fakes for every collaborator seam, plus a small builder that
// wires them into an Orchestrator.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use headline_bot::ai::{DynImageGenerator, DynTextGenerator, ImageGenerator, PromptSpec, TextGenerator};
use headline_bot::dedupe::DedupeStore;
use headline_bot::error::{BotError, Result};
use headline_bot::feed::types::{ContentItem, FeedClient};
use headline_bot::media::{MediaAsset, MediaPolicy, MediaQuota, DEFAULT_KEYWORDS};
use headline_bot::publish::{PostingClient, Publisher};
use headline_bot::status::StatusHandle;
use headline_bot::transform::{Decoration, Transformer};
use headline_bot::{Orchestrator, OrchestratorSettings};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn item(url: &str, title: &str) -> ContentItem {
    ContentItem::new(url, title).with_link(url)
}

// ---------- feed ----------

pub struct FakeFeed {
    name: String,
    items: Option<Vec<ContentItem>>,
    pub calls: AtomicUsize,
}

impl FakeFeed {
    pub fn ok(name: &str, items: Vec<ContentItem>) -> Self {
        let items = items.into_iter().map(|i| i.with_partition(name)).collect();
        Self {
            name: name.to_string(),
            items: Some(items),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FeedClient for FakeFeed {
    async fn fetch_items(&self) -> Result<Vec<ContentItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.items.clone().ok_or_else(|| BotError::FeedUnavailable {
            partition: self.name.clone(),
            reason: "HTTP 503".into(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------- generators ----------

pub enum TextMode {
    Echo(String),
    Fail,
    Empty,
    /// Never answers.
    Hang,
}

pub struct FakeTextGen {
    mode: TextMode,
    pub prompts: Mutex<Vec<PromptSpec>>,
}

impl FakeTextGen {
    pub fn echo(text: &str) -> Arc<Self> {
        Arc::new(Self {
            mode: TextMode::Echo(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            mode: TextMode::Fail,
            prompts: Mutex::new(Vec::new()),
        })
    }
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            mode: TextMode::Empty,
            prompts: Mutex::new(Vec::new()),
        })
    }
    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            mode: TextMode::Hang,
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TextGenerator for FakeTextGen {
    async fn generate_text(&self, prompt: &PromptSpec) -> Result<String> {
        self.prompts.lock().push(prompt.clone());
        match &self.mode {
            TextMode::Echo(s) => Ok(s.clone()),
            TextMode::Fail => Err(BotError::GenerationFailed("HTTP 500".into())),
            TextMode::Empty => Ok("   ".into()),
            TextMode::Hang => std::future::pending().await,
        }
    }
    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakeImageGen {
    fail: bool,
    pub calls: AtomicUsize,
}

impl FakeImageGen {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }
}

pub fn png() -> MediaAsset {
    MediaAsset {
        bytes: vec![0x89, b'P', b'N', b'G'],
        mime: "image/png".into(),
        source_url: None,
    }
}

#[async_trait]
impl ImageGenerator for FakeImageGen {
    async fn generate_image(&self, _prompt: &str) -> Result<MediaAsset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BotError::ImageGenerationFailed("HTTP 500".into()));
        }
        Ok(png())
    }
    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

// ---------- poster ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPost {
    pub text: String,
    pub media_id: Option<String>,
}

#[derive(Default)]
pub struct FakePoster {
    pub fail_upload: bool,
    pub fail_submit: bool,
    /// Reject only posts whose text contains this marker.
    pub reject_containing: Option<String>,
    pub uploads: AtomicUsize,
    pub posts: Mutex<Vec<SentPost>>,
}

impl FakePoster {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<SentPost> {
        self.posts.lock().clone()
    }
}

#[async_trait]
impl PostingClient for FakePoster {
    async fn upload_media(&self, _asset: &MediaAsset) -> Result<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload {
            return Err(BotError::MediaUploadFailed("HTTP 413".into()));
        }
        Ok("media-1".into())
    }

    async fn submit_post(&self, text: &str, media_id: Option<&str>) -> Result<String> {
        let rejected = self.fail_submit
            || self
                .reject_containing
                .as_deref()
                .is_some_and(|m| text.contains(m));
        if rejected {
            return Err(BotError::PublishRejected {
                status: Some(403),
                reason: "duplicate content".into(),
            });
        }
        let mut posts = self.posts.lock();
        posts.push(SentPost {
            text: text.to_string(),
            media_id: media_id.map(str::to_string),
        });
        Ok(format!("post-{}", posts.len()))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

// ---------- wiring ----------

pub struct Harness {
    pub feeds: Vec<Box<dyn FeedClient>>,
    pub dedupe: DedupeStore,
    pub text: DynTextGenerator,
    pub image: DynImageGenerator,
    pub poster: Arc<FakePoster>,
    pub quota: MediaQuota,
    pub media_enabled: bool,
    pub max_chars: usize,
    pub settings: OrchestratorSettings,
    pub today: NaiveDate,
}

impl Harness {
    pub fn new(feeds: Vec<Box<dyn FeedClient>>) -> Self {
        let today = day(2024, 5, 1);
        Self {
            feeds,
            dedupe: DedupeStore::in_memory(),
            text: FakeTextGen::echo("generated copy"),
            image: FakeImageGen::ok(),
            poster: FakePoster::ok(),
            quota: MediaQuota::in_memory(3, today),
            media_enabled: true,
            max_chars: 280,
            settings: OrchestratorSettings {
                call_timeout_secs: 5,
                ..Default::default()
            },
            today,
        }
    }

    pub fn build(self) -> Orchestrator {
        let transformer = Transformer::new(
            self.text,
            "Rewrite as a post.".into(),
            100,
            self.settings.call_timeout_secs,
            Decoration::none(),
            self.max_chars,
        );
        let media = MediaPolicy::new(
            self.media_enabled,
            DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            self.quota,
            self.image,
            self.settings.call_timeout_secs,
        );
        let publisher = Publisher::new(self.poster, self.settings.call_timeout_secs);
        let today = self.today;
        Orchestrator::new(
            self.feeds,
            self.dedupe,
            transformer,
            media,
            publisher,
            StatusHandle::new(true),
            self.settings,
        )
        .with_clock(move || today)
    }
}
