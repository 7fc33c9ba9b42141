// src/telemetry.rs
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "headline_bot=info,pipeline=info,dry_run=info,warn";

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
/// Uses `try_init`, so a subscriber installed by the hosting runtime wins.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Item id as it appears in logs: raw, or a short SHA-256 prefix when
/// `LOG_ANON_IDS=1`.
pub fn log_id(id: &str) -> String {
    if std::env::var("LOG_ANON_IDS").ok().as_deref() == Some("1") {
        anon_hash(id)
    } else {
        id.to_string()
    }
}

pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
