//! # Orchestrator
//! One tick of the publish pipeline:
//! `Idle → Fetching → Filtering → Transforming → DecidingMedia → Publishing → Recording → Idle`.
//!
//! - Feed partitions are fetched concurrently; a failing partition adds nothing.
//! - Seen, malformed, and same-tick duplicate items are filtered out.
//! - Candidates are tried strictly one after another; the first successful
//!   post ends the tick (one post per tick).
//! - A failed post leaves the item unrecorded, so a later tick may retry it.
//! - Nothing here returns an error: every failure ends in a `TickOutcome`.

use chrono::{Local, NaiveDate, Utc};
use metrics::{counter, gauge, histogram};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::HashSet;

use crate::dedupe::DedupeStore;
use crate::feed::{self, types::ContentItem, types::FeedClient};
use crate::media::MediaPolicy;
use crate::publish::Publisher;
use crate::status::StatusHandle;
use crate::telemetry::log_id;
use crate::transform::{MessageOrigin, Transformer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    Idle,
    Fetching,
    Filtering,
    Transforming,
    DecidingMedia,
    Publishing,
    Recording,
}

impl TickPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            TickPhase::Idle => "idle",
            TickPhase::Fetching => "fetching",
            TickPhase::Filtering => "filtering",
            TickPhase::Transforming => "transforming",
            TickPhase::DecidingMedia => "deciding_media",
            TickPhase::Publishing => "publishing",
            TickPhase::Recording => "recording",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Published {
        id: String,
        post_id: Option<String>,
        media_attached: bool,
        origin: MessageOrigin,
    },
    /// Every candidate was tried and none was posted.
    Exhausted { attempted: usize },
    NoCandidates {
        fetched: usize,
        skipped_seen: usize,
        skipped_malformed: usize,
    },
}

impl TickOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TickOutcome::Published { .. } => "published",
            TickOutcome::Exhausted { .. } => "exhausted",
            TickOutcome::NoCandidates { .. } => "no_candidates",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, TickOutcome::Published { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrchestratorSettings {
    pub shuffle_candidates: bool,
    /// 0 = unlimited.
    pub max_attempts_per_tick: usize,
    pub call_timeout_secs: u64,
    pub seed: Option<u64>,
}

/// Items left after filtering, plus what was dropped.
#[derive(Debug, Default)]
pub struct Candidates {
    pub items: Vec<ContentItem>,
    pub skipped_seen: usize,
    pub skipped_malformed: usize,
}

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct Orchestrator {
    feeds: Vec<Box<dyn FeedClient>>,
    dedupe: DedupeStore,
    transformer: Transformer,
    media: MediaPolicy,
    publisher: Publisher,
    status: StatusHandle,
    settings: OrchestratorSettings,
    rng: StdRng,
    today: Clock,
}

impl Orchestrator {
    pub fn new(
        feeds: Vec<Box<dyn FeedClient>>,
        dedupe: DedupeStore,
        transformer: Transformer,
        media: MediaPolicy,
        publisher: Publisher,
        status: StatusHandle,
        settings: OrchestratorSettings,
    ) -> Self {
        let rng = match settings.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            feeds,
            dedupe,
            transformer,
            media,
            publisher,
            status,
            settings,
            rng,
            today: Box::new(|| Local::now().date_naive()),
        }
    }

    /// Replace the calendar used for the media quota day boundary.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    pub fn dedupe(&self) -> &DedupeStore {
        &self.dedupe
    }

    pub fn media(&self) -> &MediaPolicy {
        &self.media
    }

    pub fn status(&self) -> &StatusHandle {
        &self.status
    }

    /// Drop seen, malformed and repeated items; apply the configured order.
    pub fn select_candidates(&mut self, fetched: Vec<ContentItem>) -> Candidates {
        let mut out = Candidates::default();
        let mut this_tick: HashSet<String> = HashSet::new();
        for item in fetched {
            if let Err(e) = item.validate() {
                tracing::debug!(target: "pipeline", phase = TickPhase::Filtering.as_str(), reason = %e, "skip");
                out.skipped_malformed += 1;
                continue;
            }
            if self.dedupe.contains(&item.id) || !this_tick.insert(item.id.clone()) {
                out.skipped_seen += 1;
                continue;
            }
            out.items.push(item);
        }
        if self.settings.shuffle_candidates {
            out.items.shuffle(&mut self.rng);
        }
        counter!("bot_items_skipped_total").increment((out.skipped_seen + out.skipped_malformed) as u64);
        out
    }

    pub async fn tick(&mut self) -> TickOutcome {
        let t0 = std::time::Instant::now();
        let outcome = self.run_pipeline().await;

        counter!("bot_ticks_total").increment(1);
        histogram!("bot_tick_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        self.status.record_tick(outcome.label(), Utc::now());
        tracing::info!(target: "pipeline", phase = TickPhase::Idle.as_str(), outcome = outcome.label(), "tick finished");
        outcome
    }

    async fn run_pipeline(&mut self) -> TickOutcome {
        tracing::debug!(target: "pipeline", phase = TickPhase::Fetching.as_str(), partitions = self.feeds.len());
        let report = feed::fetch_partitions(&self.feeds, self.settings.call_timeout_secs).await;
        let fetched = report.items.len();
        if !report.failed.is_empty() {
            tracing::warn!(target: "pipeline", failed = ?report.failed, fetched, "continuing with remaining partitions");
        }

        let candidates = self.select_candidates(report.items);
        tracing::info!(
            target: "pipeline",
            phase = TickPhase::Filtering.as_str(),
            fetched,
            eligible = candidates.items.len(),
            seen = candidates.skipped_seen,
            malformed = candidates.skipped_malformed
        );
        if candidates.items.is_empty() {
            return TickOutcome::NoCandidates {
                fetched,
                skipped_seen: candidates.skipped_seen,
                skipped_malformed: candidates.skipped_malformed,
            };
        }

        let limit = match self.settings.max_attempts_per_tick {
            0 => usize::MAX,
            n => n,
        };
        let mut attempted = 0;
        for item in candidates.items.iter().take(limit) {
            attempted += 1;
            if let Some(outcome) = self.attempt(item).await {
                return outcome;
            }
        }
        TickOutcome::Exhausted { attempted }
    }

    /// transform → media → publish → record, for one candidate.
    async fn attempt(&mut self, item: &ContentItem) -> Option<TickOutcome> {
        let id = log_id(&item.id);

        tracing::debug!(target: "pipeline", phase = TickPhase::Transforming.as_str(), %id);
        let message = self.transformer.transform(item).await;

        tracing::debug!(target: "pipeline", phase = TickPhase::DecidingMedia.as_str(), %id);
        let today = (self.today)();
        let media = if self.media.should_attach_image(item, today) {
            self.media.generate_image(&item.title, today).await
        } else {
            None
        };

        tracing::debug!(target: "pipeline", phase = TickPhase::Publishing.as_str(), %id, origin = ?message.origin);
        let result = self.publisher.publish(&message.text, media.as_ref()).await;
        if !result.success {
            tracing::warn!(
                target: "pipeline",
                %id,
                reason = result.error_reason.as_deref().unwrap_or("unknown"),
                "publish failed; trying next candidate"
            );
            return None;
        }

        tracing::debug!(target: "pipeline", phase = TickPhase::Recording.as_str(), %id);
        if let Err(e) = self.dedupe.record(&item.id) {
            // the post is live; a restart may repost it, nothing else to do
            counter!("bot_dedupe_write_errors_total").increment(1);
            tracing::error!(target: "pipeline", %id, error = %e, "dedupe write failed after publish");
        }
        let now = Utc::now();
        self.status.record_publish(result.post_id.as_deref(), now);
        gauge!("bot_last_publish_ts").set(now.timestamp() as f64);
        tracing::info!(
            target: "pipeline",
            %id,
            post_id = result.post_id.as_deref().unwrap_or(""),
            media = result.media_attached,
            origin = ?message.origin,
            partition = %item.partition,
            "published"
        );

        Some(TickOutcome::Published {
            id: item.id.clone(),
            post_id: result.post_id,
            media_attached: result.media_attached,
            origin: message.origin,
        })
    }
}
