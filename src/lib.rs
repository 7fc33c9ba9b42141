// src/lib.rs
// Public library surface for the service binary, `tick_once` and integration tests.

pub mod ai;
pub mod api;
pub mod bootstrap;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod feed;
pub mod media;
pub mod metrics;
pub mod orchestrator;
pub mod publish;
pub mod scheduler;
pub mod status;
pub mod telemetry;
pub mod transform;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::error::{BotError, Result};
pub use crate::orchestrator::{Orchestrator, OrchestratorSettings, TickOutcome};
pub use crate::scheduler::Scheduler;
