use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the pipeline series.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe_pipeline_metrics();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

pub fn describe_pipeline_metrics() {
    describe_counter!("bot_ticks_total", "Completed scheduler ticks.");
    describe_counter!("bot_ticks_skipped_total", "Ticks skipped because one was in flight.");
    describe_counter!("bot_items_skipped_total", "Candidates dropped as seen or malformed.");
    describe_counter!(
        "bot_generation_fallback_total",
        "Messages rendered by the canonical fallback."
    );
    describe_counter!("bot_images_generated_total", "Images generated (quota consumed).");
    describe_counter!("bot_publish_total", "Successful posts.");
    describe_counter!("bot_publish_failures_total", "Rejected or failed posts.");
    describe_counter!(
        "bot_dedupe_write_errors_total",
        "Dedupe state writes that failed after a successful post."
    );
    describe_gauge!("bot_last_publish_ts", "Unix ts of the last successful post.");
    describe_histogram!("bot_tick_ms", "Tick duration in milliseconds.");
}
