//! Merged world overview: `level.dat` snapshot enriched with live RCON
//! queries when the circuit allows.
//!
//! The on-disk snapshot always provides a complete picture (it lags the
//! live server by the save interval); when RCON answers, its fresher
//! time/difficulty/seed/border values overlay the snapshot and the
//! `source` tag flips from `dat` to `rcon+dat`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CoreResult;
use crate::nbt::{SeedValue, Spawn};
use crate::rcon::RconClient;
use crate::save::SaveData;

/// Game ticks per in-game day.
const TICKS_PER_DAY: i64 = 24_000;

static FIRST_INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+").expect("valid regex"));
static FIRST_FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(\.\d+)?").expect("valid regex"));

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderOverview {
    pub size: f64,
    pub center: BorderCenter,
}

#[derive(Debug, Clone, Serialize)]
pub struct BorderCenter {
    pub x: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldOverview {
    pub seed: Option<SeedValue>,
    /// Completed in-game days.
    pub day: i64,
    /// Clock label for the current time of day, e.g. `13:30`.
    pub time_of_day: String,
    pub weather: &'static str,
    pub difficulty: &'static str,
    pub gamemode: &'static str,
    pub spawn: Spawn,
    pub world_age_ticks: i64,
    pub version: String,
    pub world_border: Option<BorderOverview>,
    /// `rcon+dat` when live queries contributed, `dat` otherwise.
    pub source: &'static str,
}

/// Build the overview, overlaying live RCON values when reachable.
pub async fn overview(save: &SaveData, rcon: &RconClient) -> CoreResult<WorldOverview> {
    let meta = save.read_world_metadata().await?;

    let mut seed = meta.seed.clone();
    let mut world_age = meta.world_age_ticks;
    let mut day_time = meta.day_time_ticks;
    let mut difficulty = difficulty_name(meta.difficulty);
    let mut border_size = meta.border.size;
    let mut source = "dat";

    // One probe decides: if the first query fails (or the circuit is
    // already open) the rest are skipped and the snapshot stands alone.
    if let Ok(reply) = rcon.send("time query gametime").await {
        source = "rcon+dat";
        if let Some(ticks) = first_int(&reply) {
            world_age = ticks;
        }
        if let Ok(reply) = rcon.send("time query daytime").await {
            if let Some(ticks) = first_int(&reply) {
                day_time = ticks;
            }
        }
        if let Ok(reply) = rcon.send("difficulty").await {
            difficulty = difficulty_from_reply(&reply).unwrap_or(difficulty);
        }
        if let Ok(reply) = rcon.send("seed").await {
            if let Some(live_seed) = first_int(&reply) {
                seed = Some(SeedValue::Int(live_seed));
            }
        }
        if let Ok(reply) = rcon.send("worldborder get").await {
            if let Some(size) = first_float(&reply) {
                border_size = size;
            }
        }
    }

    Ok(WorldOverview {
        seed,
        day: world_age / TICKS_PER_DAY,
        time_of_day: clock_label(day_time),
        weather: weather_name(meta.weather.raining, meta.weather.thundering),
        difficulty,
        gamemode: gamemode_name(meta.game_type),
        spawn: meta.spawn,
        world_age_ticks: world_age,
        version: meta.version_name.unwrap_or_else(|| "unknown".to_string()),
        world_border: Some(BorderOverview {
            size: border_size,
            center: BorderCenter {
                x: meta.border.center_x,
                z: meta.border.center_z,
            },
        }),
        source,
    })
}

/// Tick 0 is 06:00; 1000 ticks per in-game hour.
pub fn clock_label(day_time_ticks: i64) -> String {
    let ticks = day_time_ticks.rem_euclid(TICKS_PER_DAY);
    let hours = (ticks / 1000 + 6) % 24;
    let minutes = (ticks % 1000) * 60 / 1000;
    format!("{hours:02}:{minutes:02}")
}

pub fn weather_name(raining: bool, thundering: bool) -> &'static str {
    match (raining, thundering) {
        (_, true) => "thunder",
        (true, false) => "rain",
        (false, false) => "clear",
    }
}

pub fn difficulty_name(difficulty: i64) -> &'static str {
    match difficulty {
        0 => "peaceful",
        1 => "easy",
        3 => "hard",
        _ => "normal",
    }
}

pub fn gamemode_name(game_type: i64) -> &'static str {
    match game_type {
        1 => "creative",
        2 => "adventure",
        3 => "spectator",
        _ => "survival",
    }
}

fn difficulty_from_reply(reply: &str) -> Option<&'static str> {
    let lower = reply.to_ascii_lowercase();
    ["peaceful", "easy", "normal", "hard"]
        .into_iter()
        .find(|name| lower.contains(name))
}

fn first_int(text: &str) -> Option<i64> {
    FIRST_INT_RE.find(text)?.as_str().parse().ok()
}

fn first_float(text: &str) -> Option<f64> {
    FIRST_FLOAT_RE.find(text)?.as_str().parse().ok()
}
