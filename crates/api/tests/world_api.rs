//! Integration tests for the world routes and the admin reload.

mod common;

use axum::http::StatusCode;
use common::{assert_error, body_json, build_test_app, get, post};

// ---------------------------------------------------------------------------
// Test: overview without a level.dat is a 503 with the error envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn overview_without_level_dat_is_data_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(&dir);

    let response = get(app, "/api/v1/world/overview").await;
    assert_error(response, StatusCode::SERVICE_UNAVAILABLE, "DATA_UNAVAILABLE").await;
}

// ---------------------------------------------------------------------------
// Test: events with no log file degrade to an empty list
// ---------------------------------------------------------------------------

#[tokio::test]
async fn events_without_log_file_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(&dir);

    let response = get(app, "/api/v1/world/events").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

// ---------------------------------------------------------------------------
// Test: events parses and classifies the newest log lines
// ---------------------------------------------------------------------------

#[tokio::test]
async fn events_classify_log_lines() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    std::fs::create_dir_all(&logs).unwrap();
    std::fs::write(
        logs.join("latest.log"),
        "[10:00:00] [Server thread/INFO]: Steve joined the game\n\
         [10:05:00] [Server thread/INFO]: Steve was slain by Zombie\n",
    )
    .unwrap();
    let app = build_test_app(&dir);

    let response = get(app, "/api/v1/world/events?limit=10").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let events = json.as_array().unwrap();
    assert_eq!(events.len(), 2);
    // Newest last.
    assert_eq!(events[0]["type"], "join");
    assert_eq!(events[1]["type"], "death");
}

// ---------------------------------------------------------------------------
// Test: POST /admin/reload answers ok and busts the payload cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_reload_clears_caches() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(&dir);

    // Prime the events cache.
    let first = get(app.clone(), "/api/v1/world/events").await;
    assert_eq!(first.status(), StatusCode::OK);

    let response = post(app.clone(), "/api/v1/admin/reload").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");

    // The route still answers after the reset.
    let second = get(app, "/api/v1/world/events").await;
    assert_eq!(second.status(), StatusCode::OK);
}
