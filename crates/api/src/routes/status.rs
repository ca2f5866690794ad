use axum::extract::State;
use axum::{routing::get, Json, Router};
use craftstats_core::status::{parse_list_output, PlayerListStatus};
use craftstats_core::{ping, CoreError};

use crate::error::AppResult;
use crate::state::AppState;

const CACHE_KEY: &str = "status";

/// GET /status -- current server occupancy.
///
/// Fallback chain, each stage tagged in `raw`: parse the RCON `list`
/// reply; if RCON is down, coarse numbers from a server-list ping; if the
/// game port is dead too, all zeros tagged `offline`. The chain never
/// surfaces an error -- an unreachable server is a valid answer here.
async fn get_status(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    if let Some(hit) = state.cache.get(CACHE_KEY) {
        return Ok(Json(hit));
    }

    let status = occupancy(&state).await;

    let payload = serde_json::to_value(&status)?;
    state.cache.insert(CACHE_KEY, payload.clone(), state.config.cache_ttl);
    Ok(Json(payload))
}

async fn occupancy(state: &AppState) -> PlayerListStatus {
    match state.rcon.send("list").await {
        Ok(reply) => parse_list_output(&reply),
        Err(err) => {
            tracing::debug!(error = %err, "rcon list failed, falling back to ping");
            ping_fallback(state).await
        }
    }
}

async fn ping_fallback(state: &AppState) -> PlayerListStatus {
    let host = &state.config.rcon.host;
    match ping::server_list_ping(host, state.config.game_port, state.config.ping_timeout).await {
        Ok(result) => {
            let (online, max) = result
                .players
                .map(|p| (p.online, p.max))
                .unwrap_or((0, 0));
            PlayerListStatus {
                online,
                max,
                names: Vec::new(),
                raw: "ping".into(),
            }
        }
        Err(err @ (CoreError::Unreachable | CoreError::Timeout(_))) => {
            tracing::debug!(error = %err, "ping failed, reporting offline");
            PlayerListStatus::offline("offline")
        }
        Err(err) => {
            tracing::warn!(error = %err, "ping protocol failure, reporting offline");
            PlayerListStatus::offline("offline")
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(get_status))
}
