// tests/scheduler_single_flight.rs
//
// Ticks never overlap, and shutdown lets the in-flight tick finish.

mod common;

use async_trait::async_trait;
use common::*;
use headline_bot::error::Result;
use headline_bot::feed::types::{ContentItem, FeedClient};
use headline_bot::Scheduler;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};

/// Feed that parks inside `fetch_items` until released.
struct GateFeed {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl FeedClient for GateFeed {
    async fn fetch_items(&self) -> Result<Vec<ContentItem>> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(vec![item("https://n.example/gated", "Gated story")])
    }

    fn name(&self) -> &str {
        "gate"
    }
}

fn gated() -> (GateFeed, Arc<Notify>, Arc<Notify>) {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    (
        GateFeed {
            started: started.clone(),
            release: release.clone(),
        },
        started,
        release,
    )
}

#[tokio::test]
async fn tick_requested_while_one_is_in_flight_is_skipped() {
    let (feed, started, release) = gated();
    let h = Harness::new(vec![Box::new(feed)]);
    // fetch timeout must outlast the gate
    let scheduler = Scheduler::new(h.build(), Duration::from_secs(3600));

    let background = scheduler.clone();
    let first = tokio::spawn(async move { background.run_once().await });
    started.notified().await;

    assert!(scheduler.run_once().await.is_none(), "overlapping tick must be skipped");

    release.notify_one();
    let outcome = first.await.unwrap().expect("first tick ran");
    assert!(outcome.is_published());
}

#[tokio::test]
async fn shutdown_waits_for_the_in_flight_tick() {
    let (feed, started, release) = gated();
    let h = Harness::new(vec![Box::new(feed)]);
    let poster = h.poster.clone();
    let orch = h.build();
    let status = orch.status().clone();
    let scheduler = Scheduler::new(orch, Duration::from_secs(3600));

    let (tx, rx) = watch::channel(false);
    let handle = scheduler.spawn(rx);

    started.notified().await;
    tx.send(true).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_finished(), "loop must not stop mid-tick");

    release.notify_one();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler stops after the tick")
        .unwrap();

    assert_eq!(poster.sent().len(), 1);
    assert_eq!(status.snapshot().ticks, 1);
}

#[tokio::test(start_paused = true)]
async fn ticks_once_at_start_then_every_interval() {
    let items = (0..10)
        .map(|i| item(&format!("https://n.example/{i}"), &format!("Story {i}")))
        .collect();
    let h = Harness::new(vec![Box::new(FakeFeed::ok("p1", items))]);
    let orch = h.build();
    let status = orch.status().clone();
    let scheduler = Scheduler::new(orch, Duration::from_secs(60));

    let (tx, rx) = watch::channel(false);
    let handle = scheduler.spawn(rx);

    tokio::time::sleep(Duration::from_secs(130)).await;
    tx.send(true).unwrap();
    handle.await.unwrap();

    // t = 0, 60, 120
    assert_eq!(status.snapshot().ticks, 3);
    assert_eq!(status.snapshot().published_total, 3);
}
