use axum::extract::{Path, Query, State};
use axum::{routing::get, Json, Router};
use craftstats_core::advancements::{self, CompletedAdvancement};
use craftstats_core::profile::{extract_profile, StatTotals, TopLists};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppResult;
use crate::state::AppState;

/// How many recently-completed advancements the profile payload carries.
const RECENT_LIMIT: usize = 5;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerSummary {
    uuid: String,
    name: String,
    last_seen: Option<String>,
}

/// GET /players -- every player known to the save, sorted by uuid.
async fn list_players(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    if let Some(hit) = state.cache.get("players") {
        return Ok(Json(hit));
    }

    let ids = state.save.list_player_ids().await?;
    let identities = state.save.load_identity_map().await;

    let players: Vec<PlayerSummary> = ids
        .into_iter()
        .map(|uuid| PlayerSummary {
            name: identities.name_for(&uuid).unwrap_or(&uuid).to_string(),
            last_seen: identities.last_seen_for(&uuid).map(str::to_string),
            uuid,
        })
        .collect();

    let payload = json!({ "total": players.len(), "players": players });
    state.cache.insert("players", payload.clone(), state.config.cache_ttl);
    Ok(Json(payload))
}

#[derive(Deserialize)]
struct PlayerParams {
    include: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerAdvancements {
    total: usize,
    recent: Vec<CompletedAdvancement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    all: Option<Vec<CompletedAdvancement>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerDetail {
    uuid: String,
    name: String,
    last_seen: Option<String>,
    stats: StatTotals,
    top: TopLists,
    advancements: PlayerAdvancements,
}

/// GET /players/{key} -- profile for one player, addressed by name or uuid.
///
/// The payload always carries the completion total and the most recent
/// completions; `?include=all` appends the untruncated list. The cache key
/// carries the include flag so the wider payload is never served to a
/// request that did not ask for it.
async fn get_player(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<PlayerParams>,
) -> AppResult<Json<serde_json::Value>> {
    let include_all = params.include.as_deref() == Some("all");

    let identities = state.save.load_identity_map().await;
    let uuid = identities.resolve(&key);

    let cache_key = format!("player:{uuid}:{include_all}");
    if let Some(hit) = state.cache.get(&cache_key) {
        return Ok(Json(hit));
    }

    let raw = state.save.read_stats_raw(&uuid).await;
    let profile = extract_profile(&raw);

    let record = state.save.read_advancement_record(&uuid).await;
    let completed = advancements::completed_entries(record.as_ref());
    let mut recent = completed.clone();
    recent.truncate(RECENT_LIMIT);

    let detail = PlayerDetail {
        name: identities.name_for(&uuid).unwrap_or(&uuid).to_string(),
        last_seen: identities.last_seen_for(&uuid).map(str::to_string),
        uuid,
        stats: profile.totals,
        top: profile.top,
        advancements: PlayerAdvancements {
            total: completed.len(),
            recent,
            all: include_all.then_some(completed),
        },
    };

    let payload = serde_json::to_value(&detail)?;
    state.cache.insert(cache_key, payload.clone(), state.config.cache_ttl);
    Ok(Json(payload))
}

/// GET /players/{key}/advancements -- full reconciled report.
async fn get_player_advancements(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let identities = state.save.load_identity_map().await;
    let uuid = identities.resolve(&key);

    let cache_key = format!("advancements:{uuid}");
    if let Some(hit) = state.cache.get(&cache_key) {
        return Ok(Json(hit));
    }

    let record = state.save.read_advancement_record(&uuid).await;
    let catalog = state.catalog.get().await;
    let report = advancements::reconcile(record.as_ref(), &catalog);

    let payload = serde_json::to_value(&report)?;
    state.cache.insert(cache_key, payload.clone(), state.config.cache_ttl);
    Ok(Json(payload))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/players", get(list_players))
        .route("/players/{key}", get(get_player))
        .route("/players/{key}/advancements", get(get_player_advancements))
}
