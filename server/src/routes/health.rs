//! Liveness endpoints.

use axum::{extract::State, routing::get, Json, Router};
use buendia_engine::{EntityKind, BUFFER_WINDOW_MS};
use serde::Serialize;

use crate::AppState;

/// What a client can learn about the server before its first sync.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Entity kinds served under `/{kind}`
    pub kinds: Vec<EntityKind>,
    pub max_page_size: usize,
    /// Bookmarks are never newer than request time minus this many ms
    pub buffer_window_ms: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        kinds: EntityKind::ALL.to_vec(),
        max_page_size: state.config.max_page_size,
        buffer_window_ms: BUFFER_WINDOW_MS,
    })
}

async fn root() -> &'static str {
    "Buendia Sync Server"
}
