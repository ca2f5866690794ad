use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use craftstats_core::leaderboard::{self, LeaderboardQuery, SortOrder, DEFAULT_LIMIT};
use serde::Deserialize;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Deserialize)]
struct LeaderboardParams {
    metric: Option<String>,
    order: Option<String>,
    limit: Option<usize>,
}

/// GET /leaderboard -- players ranked by a metric.
///
/// Defaults: `metric=playTime`, `order=desc`, `limit=50`. Unknown metrics
/// and out-of-range limits are handled in core (empty board, clamp), so
/// every combination of query params yields a 200 or a 503.
async fn get_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> AppResult<Json<serde_json::Value>> {
    let query = LeaderboardQuery {
        metric: params.metric.unwrap_or_else(|| "playTime".into()),
        order: SortOrder::parse(params.order.as_deref()),
        limit: params.limit.unwrap_or(DEFAULT_LIMIT),
    };

    let cache_key = format!(
        "leaderboard:{}:{:?}:{}",
        query.metric, query.order, query.limit
    );
    if let Some(hit) = state.cache.get(&cache_key) {
        return Ok(Json(hit));
    }

    let catalog_ids = state.catalog.ids().await;
    let board = leaderboard::compute(&state.save, &catalog_ids, &query).await?;

    let payload = serde_json::to_value(&board)?;
    state.cache.insert(cache_key, payload.clone(), state.config.cache_ttl);
    Ok(Json(payload))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/leaderboard", get(get_leaderboard))
}
