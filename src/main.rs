//! headline-bot service entrypoint.
//! Starts the publish scheduler in the background and serves the status surface.

use headline_bot::{api, bootstrap::BotRuntime, metrics::Metrics, telemetry};
use shuttle_axum::ShuttleAxum;
use tokio::sync::watch;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    // Missing credentials are fatal here, before the first tick.
    let runtime = BotRuntime::from_env()?;

    let mut router = api::router(runtime.status.clone());
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = %e, "metrics recorder not installed; /metrics disabled"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticking = runtime.scheduler.clone().spawn(shutdown_rx);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested; waiting for the current tick");
            let _ = shutdown_tx.send(true);
            let _ = ticking.await;
        }
    });

    Ok(router.into())
}
