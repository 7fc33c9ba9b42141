// src/bootstrap.rs
//! Builds the live pipeline from config + resolved credentials.

use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::ai::openai::OpenAiClient;
use crate::ai::{DisabledGenerator, DynImageGenerator, DynTextGenerator};
use crate::config::{BotConfig, Credentials};
use crate::dedupe::DedupeStore;
use crate::feed::providers::{newsapi::NewsApiFeed, rss::RssFeed};
use crate::feed::types::FeedClient;
use crate::media::{MediaPolicy, MediaQuota};
use crate::orchestrator::{Orchestrator, OrchestratorSettings};
use crate::publish::{dry_run::DryRunPoster, x::XClient, DynPostingClient, Publisher};
use crate::scheduler::Scheduler;
use crate::status::StatusHandle;
use crate::transform::{Decoration, Transformer};

pub struct BotRuntime {
    pub status: StatusHandle,
    pub scheduler: Scheduler,
}

impl BotRuntime {
    /// Load config, resolve credentials (fatal when missing) and wire the pipeline.
    pub fn from_env() -> anyhow::Result<Self> {
        let cfg = BotConfig::load_default()?;
        let creds = cfg.resolve_credentials()?;
        // Safe diagnostics: only lengths of secrets
        info!(
            regions = ?cfg.feed.regions,
            rss = cfg.feed.rss_urls.len(),
            generation = cfg.generation.enabled,
            media = cfg.media.enabled,
            dry_run = cfg.publish.dry_run,
            creds = ?creds,
            "bot config loaded"
        );
        Ok(Self::build(&cfg, &creds))
    }

    pub fn build(cfg: &BotConfig, creds: &Credentials) -> Self {
        let status = StatusHandle::new(cfg.publish.dry_run);
        let orchestrator = build_orchestrator(cfg, creds, status.clone());
        let scheduler = Scheduler::new(orchestrator, Duration::from_secs(cfg.schedule.interval_secs));
        Self { status, scheduler }
    }
}

pub fn build_feeds(cfg: &BotConfig, creds: &Credentials) -> Vec<Box<dyn FeedClient>> {
    let mut feeds: Vec<Box<dyn FeedClient>> = Vec::new();
    if let Some(key) = &creds.news_api_key {
        for region in &cfg.feed.regions {
            let mut f = NewsApiFeed::new(key.clone(), region, cfg.feed.page_size);
            if let Some(url) = &cfg.feed.base_url {
                f = f.with_base_url(url.clone());
            }
            feeds.push(Box::new(f));
        }
    }
    for url in &cfg.feed.rss_urls {
        feeds.push(Box::new(RssFeed::from_url(url)));
    }
    feeds
}

pub fn build_orchestrator(cfg: &BotConfig, creds: &Credentials, status: StatusHandle) -> Orchestrator {
    let timeout = cfg.schedule.call_timeout_secs;

    let (text_gen, image_gen): (DynTextGenerator, DynImageGenerator) = match &creds.openai_api_key {
        Some(key) => {
            let mut client = OpenAiClient::new(key.clone(), &cfg.generation.model, &cfg.generation.image_model);
            if let Some(url) = &cfg.generation.base_url {
                client = client.with_base_url(url.clone());
            }
            let client = Arc::new(client);
            let text: DynTextGenerator = if cfg.generation.enabled {
                client.clone()
            } else {
                Arc::new(DisabledGenerator)
            };
            let image: DynImageGenerator = client;
            (text, image)
        }
        None => {
            let text: DynTextGenerator = Arc::new(DisabledGenerator);
            let image: DynImageGenerator = Arc::new(DisabledGenerator);
            (text, image)
        }
    };

    let decoration = Decoration::new(
        cfg.publish.suffix.clone(),
        cfg.publish.hashtags.clone(),
        cfg.schedule.seed,
    );
    let transformer = Transformer::new(
        text_gen,
        cfg.generation.instruction.clone(),
        cfg.generation.max_tokens,
        timeout,
        decoration,
        cfg.publish.max_chars,
    );

    let today = Local::now().date_naive();
    let quota = MediaQuota::load(&cfg.media.state_path, cfg.media.daily_ceiling, today);
    let media = MediaPolicy::new(
        cfg.media.enabled,
        cfg.media.keywords.clone(),
        quota,
        image_gen,
        timeout,
    );

    let (poster, publish_timeout): (DynPostingClient, u64) =
        match (&creds.x_bearer_token, cfg.publish.dry_run) {
            (Some(token), false) => {
                let mut x = XClient::new(token.clone())
                    .with_timeout(timeout)
                    .with_retries(cfg.publish.max_retries);
                if let Some(url) = &cfg.publish.base_url {
                    x = x.with_base_url(url.clone());
                }
                let deadline = x.deadline_secs();
                let poster: DynPostingClient = Arc::new(x);
                (poster, deadline)
            }
            _ => {
                let poster: DynPostingClient = Arc::new(DryRunPoster::new());
                (poster, timeout)
            }
        };
    let publisher = Publisher::new(poster, publish_timeout);

    let dedupe = DedupeStore::load(&cfg.dedupe.path).with_retention(cfg.dedupe.max_entries);

    Orchestrator::new(
        build_feeds(cfg, creds),
        dedupe,
        transformer,
        media,
        publisher,
        status,
        OrchestratorSettings {
            shuffle_candidates: cfg.schedule.shuffle_candidates,
            max_attempts_per_tick: cfg.schedule.max_attempts_per_tick,
            call_timeout_secs: timeout,
            seed: cfg.schedule.seed,
        },
    )
}
