use std::time::Duration;

use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use craftstats_core::{events, progression, world};
use serde::Deserialize;

use crate::error::AppResult;
use crate::state::AppState;

// Per-route TTLs. The overview mixes in live RCON values, so it goes stale
// fastest; the progression sweep is expensive and changes slowly.
const OVERVIEW_TTL: Duration = Duration::from_secs(3);
const PROGRESSION_TTL: Duration = Duration::from_secs(10);
const EVENTS_TTL: Duration = Duration::from_secs(2);

/// GET /world/overview -- level.dat snapshot, overlaid with live RCON
/// values when the circuit allows.
async fn get_overview(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    if let Some(hit) = state.cache.get("world:overview") {
        return Ok(Json(hit));
    }

    let overview = world::overview(&state.save, &state.rcon).await?;

    let payload = serde_json::to_value(&overview)?;
    state.cache.insert("world:overview", payload.clone(), OVERVIEW_TTL);
    Ok(Json(payload))
}

/// GET /world/progression -- bosses, dimensions, advancement totals, and
/// known structure locations.
async fn get_progression(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    if let Some(hit) = state.cache.get("world:progression") {
        return Ok(Json(hit));
    }

    let progression = progression::compute(&state.save, &state.catalog, &state.rcon).await;

    let payload = serde_json::to_value(&progression)?;
    state
        .cache
        .insert("world:progression", payload.clone(), PROGRESSION_TTL);
    Ok(Json(payload))
}

#[derive(Deserialize)]
struct EventsParams {
    limit: Option<usize>,
}

/// GET /world/events -- recent log events, newest last. `?limit` clamped
/// to at most 100, default 20.
async fn get_events(
    State(state): State<AppState>,
    Query(params): Query<EventsParams>,
) -> AppResult<Json<serde_json::Value>> {
    let limit = events::clamp_limit(params.limit);

    let cache_key = format!("world:events:{limit}");
    if let Some(hit) = state.cache.get(&cache_key) {
        return Ok(Json(hit));
    }

    let recent = events::read_recent_events(&state.config.data_dir, limit).await;

    let payload = serde_json::to_value(&recent)?;
    state.cache.insert(cache_key, payload.clone(), EVENTS_TTL);
    Ok(Json(payload))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(get_overview))
        .route("/progression", get(get_progression))
        .route("/events", get(get_events))
}
