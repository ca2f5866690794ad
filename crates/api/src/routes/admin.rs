use axum::extract::State;
use axum::{routing::post, Json, Router};
use serde_json::json;

use crate::state::AppState;

/// POST /admin/reload -- drop every cached payload and the catalog memo.
///
/// The next request for each route recomputes from disk / RCON. Used after
/// swapping the server jar or editing the world out-of-band.
async fn reload(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.cache.clear();
    state.catalog.clear().await;
    tracing::info!("payload cache and catalog memo cleared");
    Json(json!({ "status": "ok" }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/reload", post(reload))
}
