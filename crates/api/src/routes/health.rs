use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the world save is readable (stat files present).
    pub save_readable: bool,
    /// Whether the RCON circuit is currently open.
    pub rcon_circuit_open: bool,
}

/// GET /health -- returns service, save, and RCON circuit health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let save_readable = state.save.list_player_ids().await.is_ok();
    let rcon_circuit_open = state.rcon.circuit_open();

    let status = if save_readable { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        save_readable,
        rcon_circuit_open,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
