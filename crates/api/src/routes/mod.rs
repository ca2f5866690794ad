pub mod admin;
pub mod health;
pub mod leaderboard;
pub mod players;
pub mod status;
pub mod world;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /status                      occupancy (rcon list -> ping -> offline)
///
/// /players                     known players (uuid, name, lastSeen)
/// /players/{key}               player profile (?include=all)
/// /players/{key}/advancements  full reconciled advancement report
///
/// /leaderboard                 ranked players (?metric&order&limit)
///
/// /world/overview              level.dat snapshot merged with live RCON
/// /world/progression           bosses, dimensions, structures, totals
/// /world/events                recent log events (?limit)
///
/// /admin/reload                clear payload cache + catalog memo (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(status::router())
        .merge(players::router())
        .merge(leaderboard::router())
        .nest("/world", world::router())
        .nest("/admin", admin::router())
}
