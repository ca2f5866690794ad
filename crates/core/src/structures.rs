//! Structure discovery via an RCON `locate structure` sweep.
//!
//! The sweep is expensive (one serialized RCON command per target plus a
//! short pause), so results are persisted to the local structure cache and
//! reused until a forced rescan. The read path lives in
//! [`crate::save::SaveData::read_structure_locations`] and degrades to an
//! empty list.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::rcon::RconClient;
use crate::save::SaveData;

/// Pause between locate commands so the sweep does not hog the server.
const SWEEP_PAUSE: Duration = Duration::from_millis(120);

static LOCATE_WITH_DISTANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)at\s+\[(-?\d+),\s*~,\s*(-?\d+)\]\s*\(distance\s*(\d+)").expect("valid regex")
});
static LOCATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)at\s+\[(-?\d+),\s*~,\s*(-?\d+)\]").expect("valid regex"));
static COORD_PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\d+)\s*,\s*(-?\d+)").expect("valid regex"));

/// A located structure, as persisted in the structure cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureLocation {
    pub id: String,
    pub name: String,
    pub x: i64,
    pub z: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<i64>,
}

struct Target {
    id: &'static str,
    name: &'static str,
    dimension: &'static str,
}

/// The fixed sweep table: notable structures per dimension.
const TARGETS: &[Target] = &[
    Target { id: "village_plains", name: "Plains Village", dimension: "minecraft:overworld" },
    Target { id: "village_desert", name: "Desert Village", dimension: "minecraft:overworld" },
    Target { id: "village_savanna", name: "Savanna Village", dimension: "minecraft:overworld" },
    Target { id: "village_taiga", name: "Taiga Village", dimension: "minecraft:overworld" },
    Target { id: "mansion", name: "Woodland Mansion", dimension: "minecraft:overworld" },
    Target { id: "monument", name: "Ocean Monument", dimension: "minecraft:overworld" },
    Target { id: "trial_chambers", name: "Trial Chambers", dimension: "minecraft:overworld" },
    Target { id: "ancient_city", name: "Ancient City", dimension: "minecraft:overworld" },
    Target { id: "stronghold", name: "Stronghold", dimension: "minecraft:overworld" },
    Target { id: "fortress", name: "Nether Fortress", dimension: "minecraft:the_nether" },
    Target { id: "bastion_remnant", name: "Bastion Remnant", dimension: "minecraft:the_nether" },
    Target { id: "end_city", name: "End City", dimension: "minecraft:the_end" },
];

/// Return the known structure list, running the RCON sweep only when the
/// persisted cache is empty (or `force` is set).
///
/// Per-target failures are skipped. An empty cache counts as "no sweep
/// yet", so a sweep that found nothing will be retried by the next caller.
pub async fn scan(rcon: &RconClient, save: &SaveData, force: bool) -> Vec<StructureLocation> {
    if !force {
        let cached = save.read_structure_locations().await;
        if !cached.is_empty() {
            return cached;
        }
    }

    let mut found = Vec::new();
    for target in TARGETS {
        let command = format!(
            "execute in {} run locate structure minecraft:{}",
            target.dimension, target.id
        );
        match rcon.send_queued(&command).await {
            Ok(reply) => {
                if let Some(location) = parse_locate_reply(target, &reply) {
                    found.push(location);
                }
            }
            Err(err) => {
                tracing::debug!(target = target.id, error = %err, "locate failed, skipping");
            }
        }
        tokio::time::sleep(SWEEP_PAUSE).await;
    }

    persist(save, &found).await;
    found
}

fn parse_locate_reply(target: &Target, reply: &str) -> Option<StructureLocation> {
    if reply.to_ascii_lowercase().contains("could not find") {
        return None;
    }

    let (x, z, distance) = if let Some(caps) = LOCATE_WITH_DISTANCE_RE.captures(reply) {
        (
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok(),
        )
    } else if let Some(caps) = LOCATE_RE.captures(reply) {
        (caps[1].parse().ok()?, caps[2].parse().ok()?, None)
    } else if let Some(caps) = COORD_PAIR_RE.captures(reply) {
        (caps[1].parse().ok()?, caps[2].parse().ok()?, None)
    } else {
        return None;
    };

    Some(StructureLocation {
        id: format!("minecraft:{}", target.id),
        name: target.name.to_string(),
        x,
        z,
        distance,
    })
}

/// Best-effort cache write; failure is logged and ignored.
async fn persist(save: &SaveData, locations: &[StructureLocation]) {
    let path = save.structure_cache_path();
    if let Some(parent) = path.parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }
    match serde_json::to_vec_pretty(locations) {
        Ok(payload) => {
            if let Err(err) = tokio::fs::write(&path, payload).await {
                tracing::warn!(error = %err, path = %path.display(), "cannot persist structure cache");
            }
        }
        Err(err) => tracing::warn!(error = %err, "cannot serialize structure cache"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRONGHOLD: &Target = &Target {
        id: "stronghold",
        name: "Stronghold",
        dimension: "minecraft:overworld",
    };

    #[test]
    fn parses_reply_with_distance() {
        let reply = "The nearest minecraft:stronghold is at [1234, ~, -567] (distance 890)";
        let loc = parse_locate_reply(STRONGHOLD, reply).unwrap();
        assert_eq!((loc.x, loc.z, loc.distance), (1234, -567, Some(890)));
        assert_eq!(loc.id, "minecraft:stronghold");
        assert_eq!(loc.name, "Stronghold");
    }

    #[test]
    fn parses_reply_without_distance() {
        let reply = "Located structure at [-40, ~, 72]";
        let loc = parse_locate_reply(STRONGHOLD, reply).unwrap();
        assert_eq!((loc.x, loc.z, loc.distance), (-40, 72, None));
    }

    #[test]
    fn not_found_reply_yields_none() {
        assert!(parse_locate_reply(STRONGHOLD, "Could not find a structure of type").is_none());
    }

    #[test]
    fn unparseable_reply_yields_none() {
        assert!(parse_locate_reply(STRONGHOLD, "Unknown command").is_none());
    }

    #[tokio::test]
    async fn scan_prefers_non_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let save = SaveData::new(dir.path(), dir.path().join("world"), dir.path().join("local"));
        let cached = vec![StructureLocation {
            id: "minecraft:monument".to_string(),
            name: "Ocean Monument".to_string(),
            x: 10,
            z: 20,
            distance: None,
        }];
        let path = save.structure_cache_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, serde_json::to_string(&cached).unwrap()).unwrap();

        // RCON points nowhere; the cache must satisfy the call without it.
        let rcon = RconClient::new(crate::rcon::RconConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            connect_timeout: Duration::from_millis(50),
            command_timeout: Duration::from_millis(50),
            ..Default::default()
        });
        assert_eq!(scan(&rcon, &save, false).await, cached);
    }
}
