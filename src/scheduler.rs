// src/scheduler.rs
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::orchestrator::{Orchestrator, TickOutcome};

/// Drives the orchestrator: one tick at start, then one per interval.
/// Ticks never overlap; shutdown is honoured only between ticks.
#[derive(Clone)]
pub struct Scheduler {
    orchestrator: Arc<Mutex<Orchestrator>>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(orchestrator: Orchestrator, interval: Duration) -> Self {
        Self {
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            interval,
        }
    }

    /// Run one tick unless another is in flight; `None` means skipped.
    pub async fn run_once(&self) -> Option<TickOutcome> {
        let Ok(mut guard) = self.orchestrator.try_lock() else {
            counter!("bot_ticks_skipped_total").increment(1);
            tracing::warn!(target: "scheduler", "tick still in flight; skipping");
            return None;
        };
        Some(guard.tick().await)
    }

    /// Spawn the timer loop. Send `true` on `shutdown` to stop after the
    /// current tick.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(target: "scheduler", interval_secs = self.interval.as_secs(), "scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                // not raced against shutdown: an in-flight tick always completes
                if let Some(outcome) = self.run_once().await {
                    tracing::debug!(target: "scheduler", outcome = ?outcome, "tick done");
                }

                if *shutdown.borrow() {
                    break;
                }
            }
            tracing::info!(target: "scheduler", "scheduler stopped");
        })
    }
}
