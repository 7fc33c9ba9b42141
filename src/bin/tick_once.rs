//! Run exactly one pipeline tick with the configured collaborators and print the outcome.
//!
//! ```text
//! DRY_RUN=1 cargo run --bin tick_once
//! ```

use headline_bot::{bootstrap::BotRuntime, telemetry, TickOutcome};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let runtime = BotRuntime::from_env()?;
    let outcome = runtime
        .scheduler
        .run_once()
        .await
        .ok_or_else(|| anyhow::anyhow!("tick already in flight"))?;

    let summary = match &outcome {
        TickOutcome::Published {
            id,
            post_id,
            media_attached,
            origin,
        } => json!({
            "outcome": outcome.label(),
            "id": id,
            "post_id": post_id,
            "media_attached": media_attached,
            "origin": origin,
        }),
        TickOutcome::Exhausted { attempted } => json!({
            "outcome": outcome.label(),
            "attempted": attempted,
        }),
        TickOutcome::NoCandidates {
            fetched,
            skipped_seen,
            skipped_malformed,
        } => json!({
            "outcome": outcome.label(),
            "fetched": fetched,
            "skipped_seen": skipped_seen,
            "skipped_malformed": skipped_malformed,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!("status: {}", serde_json::to_string(&runtime.status.snapshot())?);
    Ok(())
}
