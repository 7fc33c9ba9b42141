//! status.rs: process-wide view of the pipeline for the HTTP status surface.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Serialize)]
pub struct BotStatus {
    pub started_at: DateTime<Utc>,
    pub ticks: u64,
    pub published_total: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<String>,
    pub last_publish_at: Option<DateTime<Utc>>,
    pub last_post_id: Option<String>,
    pub dry_run: bool,
}

impl BotStatus {
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            ticks: 0,
            published_total: 0,
            last_tick_at: None,
            last_outcome: None,
            last_publish_at: None,
            last_post_id: None,
            dry_run,
        }
    }
}

/// Cheap-to-clone shared handle; writers never hold it across an await.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    inner: Arc<RwLock<BotStatus>>,
}

impl StatusHandle {
    pub fn new(dry_run: bool) -> Self {
        Self {
            inner: Arc::new(RwLock::new(BotStatus::new(dry_run))),
        }
    }

    pub fn snapshot(&self) -> BotStatus {
        self.inner.read().expect("status rwlock poisoned").clone()
    }

    pub fn record_tick(&self, outcome: &str, at: DateTime<Utc>) {
        let mut s = self.inner.write().expect("status rwlock poisoned");
        s.ticks += 1;
        s.last_tick_at = Some(at);
        s.last_outcome = Some(outcome.to_string());
    }

    pub fn record_publish(&self, post_id: Option<&str>, at: DateTime<Utc>) {
        let mut s = self.inner.write().expect("status rwlock poisoned");
        s.published_total += 1;
        s.last_publish_at = Some(at);
        s.last_post_id = post_id.map(str::to_string);
    }
}
