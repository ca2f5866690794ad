use std::path::PathBuf;
use std::time::Duration;

use craftstats_core::rcon::RconConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development
/// against a containerized server sharing its /data volume. In
/// production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,

    /// Server data directory (usercache.json, logs/).
    pub data_dir: PathBuf,
    /// World save directory (stats/, advancements/, level.dat).
    pub world_dir: PathBuf,
    /// Our writable scratch directory (catalog snapshot, structure cache).
    pub local_dir: PathBuf,
    /// Optional server-distribution jar for catalog extraction.
    pub server_jar: Option<PathBuf>,

    /// RCON connection parameters.
    pub rcon: RconConfig,

    /// Game port for the server-list-ping fallback (default: `25565`).
    pub game_port: u16,
    /// Ping deadline (default: 3000ms).
    pub ping_timeout: Duration,

    /// Default payload cache TTL (default: 10000ms).
    pub cache_ttl: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `8080`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `DATA_DIR`                | `/data`                 |
    /// | `WORLD_DIR`               | `$DATA_DIR/world`       |
    /// | `LOCAL_DATA`              | `$DATA_DIR/local`       |
    /// | `SERVER_JAR`              | unset (no archive)      |
    /// | `RCON_HOST`               | `mc`                    |
    /// | `RCON_PORT`               | `25575`                 |
    /// | `RCON_PASSWORD`           | empty                   |
    /// | `RCON_CONNECT_TIMEOUT_MS` | `2000`                  |
    /// | `RCON_COMMAND_TIMEOUT_MS` | `2000`                  |
    /// | `RCON_BACKOFF_MS`         | `15000`                 |
    /// | `GAME_PORT`               | `25565`                 |
    /// | `PING_TIMEOUT_MS`         | `3000`                  |
    /// | `CACHE_TTL_MS`            | `10000`                 |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_parsed("PORT", 8080);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_parsed("REQUEST_TIMEOUT_SECS", 30);

        let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "/data".into()));
        let world_dir = std::env::var("WORLD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("world"));
        let local_dir = std::env::var("LOCAL_DATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("local"));
        let server_jar = std::env::var("SERVER_JAR").ok().filter(|s| !s.is_empty()).map(PathBuf::from);

        let rcon = RconConfig {
            host: std::env::var("RCON_HOST").unwrap_or_else(|_| "mc".into()),
            port: env_parsed("RCON_PORT", 25575),
            password: std::env::var("RCON_PASSWORD").unwrap_or_default(),
            connect_timeout: Duration::from_millis(env_parsed("RCON_CONNECT_TIMEOUT_MS", 2000)),
            command_timeout: Duration::from_millis(env_parsed("RCON_COMMAND_TIMEOUT_MS", 2000)),
            backoff: Duration::from_millis(env_parsed("RCON_BACKOFF_MS", 15_000)),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            data_dir,
            world_dir,
            local_dir,
            server_jar,
            rcon,
            game_port: env_parsed("GAME_PORT", 25565),
            ping_timeout: Duration::from_millis(env_parsed("PING_TIMEOUT_MS", 3000)),
            cache_ttl: Duration::from_millis(env_parsed("CACHE_TTL_MS", 10_000)),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid value: {e}")),
        Err(_) => default,
    }
}
