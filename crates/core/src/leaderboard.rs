//! Leaderboards across the whole known-player population.
//!
//! Enumerates every stat file, projects one metric per player plus a fixed
//! block of auxiliary counters, sorts, and truncates. One corrupt player
//! file must never break the board: per-player read failures degrade to
//! zeros. Only a failed enumeration of the stats directory aborts the
//! whole computation ([`CoreError::DataUnavailable`]).

use std::collections::HashSet;

use serde::Serialize;

use crate::advancements::completion_time;
use crate::error::CoreResult;
use crate::profile::{extract_profile, StatTotals};
use crate::save::SaveData;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// `desc` unless explicitly asked for `asc`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeaderboardQuery {
    pub metric: String,
    pub order: SortOrder,
    pub limit: usize,
}

impl Default for LeaderboardQuery {
    fn default() -> Self {
        Self {
            metric: "playTime".to_string(),
            order: SortOrder::Desc,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// The fixed comparison columns carried on every row regardless of metric.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardExtra {
    pub deaths: u64,
    pub mob_kills: u64,
    pub player_kills: u64,
    pub play_time: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub name: String,
    pub uuid: String,
    pub value: u64,
    pub extra: LeaderboardExtra,
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub metric: String,
    pub order: SortOrder,
    pub limit: usize,
    pub rows: Vec<LeaderboardRow>,
    /// Full pre-truncation row count, for pagination UIs.
    pub total: usize,
}

/// Compute a leaderboard over all known players.
///
/// `catalog_ids` is the advancement id set used by the `advancements`
/// metric; when the catalog is empty the metric falls back to counting a
/// player's non-recipe completions.
pub async fn compute(
    save: &SaveData,
    catalog_ids: &HashSet<String>,
    query: &LeaderboardQuery,
) -> CoreResult<Leaderboard> {
    let limit = query.limit.clamp(1, MAX_LIMIT);
    let ids = save.list_player_ids().await?;
    let identities = save.load_identity_map().await;

    let mut rows = Vec::with_capacity(ids.len());
    for uuid in ids {
        let raw = save.read_stats_raw(&uuid).await;
        let profile = extract_profile(&raw);

        let value = match metric_value(&query.metric, &profile.totals) {
            Some(value) => value,
            None if query.metric == "advancements" => {
                advancement_count(save, catalog_ids, &uuid).await
            }
            // Unknown metric: omit the row rather than failing the request.
            None => continue,
        };

        let name = identities.name_for(&uuid).unwrap_or(&uuid).to_string();
        rows.push(LeaderboardRow {
            name,
            uuid,
            value,
            extra: LeaderboardExtra {
                deaths: profile.totals.deaths,
                mob_kills: profile.totals.mob_kills,
                player_kills: profile.totals.player_kills,
                play_time: profile.totals.play_time,
            },
        });
    }

    // Name ascending breaks value ties deterministically in both orders.
    rows.sort_by(|a, b| {
        let by_value = match query.order {
            SortOrder::Desc => b.value.cmp(&a.value),
            SortOrder::Asc => a.value.cmp(&b.value),
        };
        by_value.then_with(|| a.name.cmp(&b.name))
    });

    let total = rows.len();
    rows.truncate(limit);

    Ok(Leaderboard {
        metric: query.metric.clone(),
        order: query.order,
        limit,
        rows,
        total,
    })
}

fn metric_value(metric: &str, totals: &StatTotals) -> Option<u64> {
    Some(match metric {
        "playTime" => totals.play_time,
        "deaths" => totals.deaths,
        "mobKills" => totals.mob_kills,
        "playerKills" => totals.player_kills,
        "walkCm" => totals.walk_cm,
        "flyCm" => totals.fly_cm,
        "damageDealt" => totals.damage_dealt,
        "damageTaken" => totals.damage_taken,
        _ => return None,
    })
}

/// Count a player's completed advancements. Only the evidence reduction is
/// needed here, not the full tri-state reconciliation.
async fn advancement_count(save: &SaveData, catalog_ids: &HashSet<String>, uuid: &str) -> u64 {
    let Some(record) = save.read_advancement_record(uuid).await else {
        return 0;
    };
    record
        .iter()
        .filter(|(id, _)| {
            if catalog_ids.is_empty() {
                !id.split_once(':')
                    .map(|(_, path)| path.starts_with("recipes/"))
                    .unwrap_or(false)
            } else {
                catalog_ids.contains(*id)
            }
        })
        .filter(|(_, value)| completion_time(value).is_some())
        .count() as u64
}
