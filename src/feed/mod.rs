// src/feed/mod.rs
pub mod providers;
pub mod types;

use crate::error::with_timeout;
use crate::feed::types::{ContentItem, FeedClient};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_items_total", "Items returned by feed partitions.");
        describe_counter!(
            "bot_feed_errors_total",
            "Feed partition fetch/parse failures (partition contributed zero items)."
        );
        describe_histogram!("feed_fetch_ms", "Partition fetch time in milliseconds.");
    });
}

/// Normalize feed text: decode entities, strip tags, ASCII quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Items gathered across partitions in one tick.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub items: Vec<ContentItem>,
    /// Names of partitions that failed or timed out.
    pub failed: Vec<String>,
}

/// Fetch all partitions concurrently. A failing partition is logged and
/// contributes nothing; merge order follows `feeds` order.
pub async fn fetch_partitions(feeds: &[Box<dyn FeedClient>], timeout_secs: u64) -> FetchReport {
    ensure_metrics_described();

    let fetches = feeds.iter().map(|f| async move {
        let t0 = std::time::Instant::now();
        let res = with_timeout("feed fetch", timeout_secs, f.fetch_items()).await;
        histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        (f.name().to_string(), res)
    });

    let mut report = FetchReport::default();
    for (name, res) in futures::future::join_all(fetches).await {
        match res {
            Ok(mut items) => {
                counter!("feed_items_total").increment(items.len() as u64);
                tracing::debug!(target: "pipeline", partition = %name, count = items.len(), "partition fetched");
                report.items.append(&mut items);
            }
            Err(e) => {
                tracing::warn!(target: "pipeline", error = %e, partition = %name, "partition error");
                counter!("bot_feed_errors_total").increment(1);
                report.failed.push(name);
            }
        }
    }
    report
}
