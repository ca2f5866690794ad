//! Integration tests for the leaderboard route's query handling.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, test_config};
use serde_json::json;

const STEVE: &str = "aaaaaaaabbbbccccddddeeeeeeeeeeee";
const ALEX: &str = "11111111222233334444555555555555";

fn seed_world(config: &craftstats_api::config::ServerConfig) {
    let stats = config.world_dir.join("stats");
    std::fs::create_dir_all(&stats).unwrap();

    std::fs::write(
        stats.join(format!("{STEVE}.json")),
        json!({"stats": {"minecraft:custom": {
            "minecraft:play_time": 120_000,
            "minecraft:deaths": 7
        }}})
        .to_string(),
    )
    .unwrap();
    std::fs::write(
        stats.join(format!("{ALEX}.json")),
        json!({"stats": {"minecraft:custom": {
            "minecraft:play_time": 90_000,
            "minecraft:deaths": 2
        }}})
        .to_string(),
    )
    .unwrap();

    std::fs::write(
        config.data_dir.join("usercache.json"),
        json!([
            {"name": "Steve", "uuid": "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee"},
            {"name": "Alex", "uuid": "11111111-2222-3333-4444-555555555555"}
        ])
        .to_string(),
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// Test: default query ranks by playTime descending
// ---------------------------------------------------------------------------

#[tokio::test]
async fn default_leaderboard_is_play_time_desc() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    seed_world(&config);
    let app = common::build_app_with_config(config);

    let response = get(app, "/api/v1/leaderboard").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["metric"], "playTime");
    assert_eq!(json["order"], "desc");
    assert_eq!(json["limit"], 50);
    assert_eq!(json["total"], 2);
    assert_eq!(json["rows"][0]["name"], "Steve");
    assert_eq!(json["rows"][0]["value"], 120_000);
    assert_eq!(json["rows"][1]["name"], "Alex");
}

// ---------------------------------------------------------------------------
// Test: explicit metric and ascending order flip the ranking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deaths_ascending_ranks_fewest_first() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    seed_world(&config);
    let app = common::build_app_with_config(config);

    let response = get(app, "/api/v1/leaderboard?metric=deaths&order=asc").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["rows"][0]["name"], "Alex");
    assert_eq!(json["rows"][0]["value"], 2);
    assert_eq!(json["rows"][1]["value"], 7);
}

// ---------------------------------------------------------------------------
// Test: limit=1 truncates rows but total reports the full population
// ---------------------------------------------------------------------------

#[tokio::test]
async fn limit_truncates_but_total_is_pre_truncation() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    seed_world(&config);
    let app = common::build_app_with_config(config);

    let response = get(app, "/api/v1/leaderboard?limit=1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["rows"].as_array().unwrap().len(), 1);
    assert_eq!(json["total"], 2);
}

// ---------------------------------------------------------------------------
// Test: an unknown metric yields an empty board, not an error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_metric_yields_empty_board() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    seed_world(&config);
    let app = common::build_app_with_config(config);

    let response = get(app, "/api/v1/leaderboard?metric=blocksEaten").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["rows"], serde_json::json!([]));
    assert_eq!(json["total"], 0);
}
