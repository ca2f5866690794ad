#![allow(dead_code)]

use std::net::TcpListener;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use craftstats_api::config::ServerConfig;
use craftstats_api::router::build_app_router;
use craftstats_api::state::AppState;
use craftstats_core::catalog::CatalogService;
use craftstats_core::rcon::{RconClient, RconConfig};
use craftstats_core::save::SaveData;

/// Grab a port nothing is listening on (bind, read the port, drop).
pub fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    // The listener drops on return, leaving the port closed.
    listener.local_addr().expect("local addr").port()
}

/// Build a test `ServerConfig` over a tempdir, with RCON and the game port
/// pointed at dead local ports and short timeouts so degrade paths resolve
/// quickly.
pub fn test_config(dir: &tempfile::TempDir) -> ServerConfig {
    let data_dir = dir.path().to_path_buf();
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        world_dir: data_dir.join("world"),
        local_dir: data_dir.join("local"),
        data_dir,
        server_jar: None,
        rcon: RconConfig {
            host: "127.0.0.1".to_string(),
            port: dead_port(),
            password: String::new(),
            connect_timeout: Duration::from_millis(200),
            command_timeout: Duration::from_millis(200),
            backoff: Duration::from_secs(15),
        },
        game_port: dead_port(),
        ping_timeout: Duration::from_millis(200),
        cache_ttl: Duration::from_secs(10),
    }
}

/// Build the full application router over a fresh tempdir-backed state.
///
/// This goes through [`build_app_router`] so integration tests exercise the
/// same middleware stack (CORS, request ID, timeout, tracing, panic
/// recovery) that production uses. The tempdir must outlive the router.
pub fn build_test_app(dir: &tempfile::TempDir) -> Router {
    let config = test_config(dir);
    build_app_with_config(config)
}

pub fn build_app_with_config(config: ServerConfig) -> Router {
    std::fs::create_dir_all(config.world_dir.join("stats")).expect("create stats dir");
    std::fs::create_dir_all(config.world_dir.join("advancements")).expect("create adv dir");
    std::fs::create_dir_all(&config.local_dir).expect("create local dir");

    let rcon = RconClient::new(config.rcon.clone());
    let save = SaveData::new(&config.data_dir, &config.world_dir, &config.local_dir);
    let catalog = CatalogService::new(
        config.server_jar.clone(),
        config.local_dir.join("data").join("adv_catalog.json"),
        None,
    );

    let state = AppState::new(config.clone(), rcon, save, catalog);
    build_app_router(state, &config)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("build request"),
    )
    .await
    .expect("infallible")
}

/// Issue a bodyless POST request against the app.
pub async fn post(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .expect("build request"),
    )
    .await
    .expect("infallible")
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Assert a response is an error with the given status and `code` field.
pub async fn assert_error(response: Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code);
    assert!(json["error"].is_string());
}
