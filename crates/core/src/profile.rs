//! Pure transform from raw per-player statistics to a normalized profile.
//!
//! The raw file is `category -> statistic key -> count`. Totals come from
//! the `minecraft:custom` category; top lists take the five highest-value
//! entries per tracked category. No I/O, fully deterministic.

use serde::Serialize;

const TOP_N: usize = 5;

/// Headline counters from the `minecraft:custom` category. Missing or
/// unknown raw entries default to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatTotals {
    pub play_time: u64,
    pub deaths: u64,
    pub mob_kills: u64,
    pub player_kills: u64,
    pub jumps: u64,
    pub walk_cm: u64,
    pub fly_cm: u64,
    pub boat_cm: u64,
    pub minecart_cm: u64,
    pub horse_cm: u64,
    pub swim_cm: u64,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub time_since_death: u64,
    pub time_since_rest: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopEntry {
    pub id: String,
    pub value: u64,
}

/// Top-5 lists per tracked category, descending by value. Ties break by id
/// ascending -- a deliberate deterministic choice where the raw map's
/// insertion order is not stable across writers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLists {
    pub mined: Vec<TopEntry>,
    pub used: Vec<TopEntry>,
    pub broken: Vec<TopEntry>,
    pub placed: Vec<TopEntry>,
    pub mobs_killed: Vec<TopEntry>,
    pub killed_by: Vec<TopEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerProfile {
    pub totals: StatTotals,
    pub top: TopLists,
}

/// Extract a profile from a raw statistics blob.
pub fn extract_profile(raw: &serde_json::Value) -> PlayerProfile {
    let custom = category(raw, "minecraft:custom");
    let total = |key: &str| entry_value(custom, &format!("minecraft:{key}"));

    PlayerProfile {
        totals: StatTotals {
            play_time: total("play_time"),
            deaths: total("deaths"),
            mob_kills: total("mob_kills"),
            player_kills: total("player_kills"),
            jumps: total("jump"),
            walk_cm: total("walk_one_cm"),
            fly_cm: total("fly_one_cm"),
            boat_cm: total("boat_one_cm"),
            minecart_cm: total("minecart_one_cm"),
            horse_cm: total("horse_one_cm"),
            swim_cm: total("swim_one_cm"),
            damage_dealt: total("damage_dealt"),
            damage_taken: total("damage_taken"),
            time_since_death: total("time_since_death"),
            time_since_rest: total("time_since_rest"),
        },
        top: TopLists {
            mined: top_n(category(raw, "minecraft:mined")),
            used: top_n(category(raw, "minecraft:used")),
            broken: top_n(category(raw, "minecraft:broken")),
            placed: top_n(category(raw, "minecraft:placed")),
            mobs_killed: top_n(category(raw, "minecraft:killed")),
            killed_by: top_n(category(raw, "minecraft:killed_by")),
        },
    }
}

fn category<'a>(raw: &'a serde_json::Value, name: &str) -> Option<&'a serde_json::Map<String, serde_json::Value>> {
    raw.get("stats")?.get(name)?.as_object()
}

fn entry_value(map: Option<&serde_json::Map<String, serde_json::Value>>, key: &str) -> u64 {
    map.and_then(|m| m.get(key))
        .and_then(|v| v.as_i64())
        .map(|v| v.max(0) as u64)
        .unwrap_or(0)
}

/// Five highest-value entries, descending; ties by id ascending. An absent
/// category yields an empty list, not an error.
fn top_n(map: Option<&serde_json::Map<String, serde_json::Value>>) -> Vec<TopEntry> {
    let Some(map) = map else {
        return Vec::new();
    };
    let mut entries: Vec<TopEntry> = map
        .iter()
        .map(|(id, value)| TopEntry {
            id: id.clone(),
            value: value.as_i64().map(|v| v.max(0) as u64).unwrap_or(0),
        })
        .collect();
    entries.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.id.cmp(&b.id)));
    entries.truncate(TOP_N);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn totals_map_custom_stats_and_default_missing_to_zero() {
        let raw = json!({
            "stats": {
                "minecraft:custom": {
                    "minecraft:play_time": 720000,
                    "minecraft:deaths": 2,
                    "minecraft:walk_one_cm": 500000
                }
            }
        });
        let profile = extract_profile(&raw);
        assert_eq!(profile.totals.play_time, 720000);
        assert_eq!(profile.totals.deaths, 2);
        assert_eq!(profile.totals.walk_cm, 500000);
        assert_eq!(profile.totals.mob_kills, 0);
        assert_eq!(profile.totals.time_since_rest, 0);
    }

    #[test]
    fn seven_mined_entries_yield_top_five_descending() {
        let raw = json!({
            "stats": {
                "minecraft:mined": {
                    "minecraft:stone": 700,
                    "minecraft:dirt": 600,
                    "minecraft:cobblestone": 500,
                    "minecraft:oak_log": 400,
                    "minecraft:sand": 300,
                    "minecraft:gravel": 200,
                    "minecraft:andesite": 100
                }
            }
        });
        let top = extract_profile(&raw).top.mined;
        let values: Vec<u64> = top.iter().map(|e| e.value).collect();
        assert_eq!(values, vec![700, 600, 500, 400, 300]);
        assert_eq!(top[0].id, "minecraft:stone");
    }

    #[test]
    fn two_entries_yield_exactly_those_two() {
        let raw = json!({
            "stats": {
                "minecraft:killed": {
                    "minecraft:zombie": 42,
                    "minecraft:skeleton": 17
                }
            }
        });
        let top = extract_profile(&raw).top.mobs_killed;
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].id.as_str(), top[0].value), ("minecraft:zombie", 42));
        assert_eq!((top[1].id.as_str(), top[1].value), ("minecraft:skeleton", 17));
    }

    #[test]
    fn equal_values_tie_break_by_id() {
        let raw = json!({
            "stats": {
                "minecraft:used": {
                    "minecraft:torch": 10,
                    "minecraft:bread": 10,
                    "minecraft:apple": 10
                }
            }
        });
        let ids: Vec<String> = extract_profile(&raw).top.used.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["minecraft:apple", "minecraft:bread", "minecraft:torch"]);
    }

    #[test]
    fn absent_categories_yield_empty_lists() {
        let profile = extract_profile(&json!({}));
        assert!(profile.top.mined.is_empty());
        assert!(profile.top.killed_by.is_empty());
        assert_eq!(profile.totals, StatTotals::default());
    }

    #[test]
    fn negative_raw_values_clamp_to_zero() {
        let raw = json!({
            "stats": {
                "minecraft:custom": {"minecraft:deaths": -5},
                "minecraft:mined": {"minecraft:stone": -1}
            }
        });
        let profile = extract_profile(&raw);
        assert_eq!(profile.totals.deaths, 0);
        assert_eq!(profile.top.mined[0].value, 0);
    }
}
