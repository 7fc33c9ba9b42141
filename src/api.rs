// src/api.rs
//! Process status surface. Not part of the pipeline contract: a window into it.

use axum::{extract::State, routing::get, Json, Router};
use tower_http::cors::CorsLayer;

use crate::status::{BotStatus, StatusHandle};

pub const ROOT_BANNER: &str = "News bot is running";

#[derive(Clone)]
pub struct AppState {
    pub status: StatusHandle,
}

pub fn router(status: StatusHandle) -> Router {
    Router::new()
        .route("/", get(|| async { ROOT_BANNER }))
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(status_json))
        .layer(CorsLayer::very_permissive())
        .with_state(AppState { status })
}

async fn status_json(State(state): State<AppState>) -> Json<BotStatus> {
    Json(state.status.snapshot())
}
