use std::net::SocketAddr;

use craftstats_core::catalog::CatalogService;
use craftstats_core::lang::LangTable;
use craftstats_core::rcon::RconClient;
use craftstats_core::save::SaveData;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use craftstats_api::config::ServerConfig;
use craftstats_api::router::build_app_router;
use craftstats_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "craftstats_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Core services ---
    let rcon = RconClient::new(config.rcon.clone());
    tracing::info!(
        host = %config.rcon.host,
        port = %config.rcon.port,
        "RCON client configured"
    );

    let save = SaveData::new(&config.data_dir, &config.world_dir, &config.local_dir);
    tracing::info!(
        data_dir = %config.data_dir.display(),
        world_dir = %config.world_dir.display(),
        "Save reader configured"
    );

    // Localized titles come out of the same archive as the catalog, when
    // one is configured.
    let lang = config
        .server_jar
        .as_deref()
        .and_then(|jar| LangTable::from_archive(jar, "minecraft", "en_us"));
    if lang.is_some() {
        tracing::info!("Language table loaded from server archive");
    }

    let snapshot_path = config.local_dir.join("data").join("adv_catalog.json");
    let catalog = CatalogService::new(config.server_jar.clone(), snapshot_path, lang);
    tracing::info!(
        archive = config.server_jar.is_some(),
        "Advancement catalog configured"
    );

    // --- App state + router ---
    let state = AppState::new(config.clone(), rcon, save, catalog);
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
