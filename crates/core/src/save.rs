//! Readers for the on-disk save data owned by the game process.
//!
//! Everything here is read-only; the files are written exclusively by the
//! server. Reads that are expected to sometimes fail (a player who never
//! joined has no stat file, the structure cache may not exist yet) degrade
//! to safe defaults instead of propagating errors. Only "the stats
//! directory exists but cannot be enumerated" surfaces as
//! [`CoreError::DataUnavailable`], because without it no aggregate view can
//! be computed at all.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::nbt::{self, WorldMetadata};
use crate::structures::StructureLocation;

/// Canonical 8-4-4-4-12 hex grouping.
static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid regex")
});

/// One row of `usercache.json`.
#[derive(Debug, Deserialize)]
struct UserCacheRow {
    name: String,
    uuid: String,
    #[serde(rename = "expiresOn")]
    expires_on: Option<String>,
}

/// Name/uuid lookup tables built from the server's name cache.
///
/// Keys are de-hyphenated lowercase-insensitive uuids as they appear in
/// stat file basenames. Built fresh on each cold read; never mutated here.
#[derive(Debug, Default)]
pub struct IdentityMap {
    pub by_uuid: HashMap<String, String>,
    pub by_name: HashMap<String, String>,
    pub last_seen: HashMap<String, String>,
}

impl IdentityMap {
    /// Resolve a display name or uuid (hyphenated or not) to a bare uuid.
    ///
    /// If the input matches the canonical uuid shape it is used directly;
    /// otherwise it is looked up as a name. An unknown name falls through
    /// as-is (last-resort passthrough, not an error) so downstream reads
    /// simply find no files for it.
    pub fn resolve(&self, key: &str) -> String {
        if UUID_RE.is_match(key) {
            return key.replace('-', "");
        }
        match self.by_name.get(key) {
            Some(uuid) => uuid.clone(),
            None => key.replace('-', ""),
        }
    }

    pub fn name_for(&self, uuid: &str) -> Option<&str> {
        self.by_uuid.get(uuid).map(String::as_str)
    }

    pub fn last_seen_for(&self, uuid: &str) -> Option<&str> {
        self.last_seen.get(uuid).map(String::as_str)
    }
}

/// Handle on the server's data directory layout.
///
/// `data_dir` is the server root (usercache.json, logs/), `world_dir` the
/// world save (stats/, advancements/, level.dat), `local_dir` our own
/// writable scratch area (catalog snapshot, structure cache).
#[derive(Debug, Clone)]
pub struct SaveData {
    pub data_dir: PathBuf,
    pub world_dir: PathBuf,
    pub local_dir: PathBuf,
}

impl SaveData {
    pub fn new(data_dir: impl Into<PathBuf>, world_dir: impl Into<PathBuf>, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            world_dir: world_dir.into(),
            local_dir: local_dir.into(),
        }
    }

    fn stats_dir(&self) -> PathBuf {
        self.world_dir.join("stats")
    }

    fn advancements_dir(&self) -> PathBuf {
        self.world_dir.join("advancements")
    }

    /// Path of the persisted structure-location cache.
    pub fn structure_cache_path(&self) -> PathBuf {
        self.local_dir.join("data").join("structures.json")
    }

    /// Enumerate known player ids from stat file basenames.
    ///
    /// A missing stats directory is normal (fresh world) and yields an
    /// empty list; any other enumeration failure is `DataUnavailable`.
    pub async fn list_player_ids(&self) -> CoreResult<Vec<String>> {
        let dir = self.stats_dir();
        let mut reader = match tokio::fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(CoreError::DataUnavailable(format!(
                    "cannot enumerate {}: {err}",
                    dir.display()
                )))
            }
        };

        let mut ids = Vec::new();
        loop {
            match reader.next_entry().await {
                Ok(Some(entry)) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if let Some(stem) = name.strip_suffix(".json") {
                        ids.push(stem.replace('-', ""));
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    return Err(CoreError::DataUnavailable(format!(
                        "cannot enumerate {}: {err}",
                        dir.display()
                    )))
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Whether any player has statistics yet.
    pub async fn has_stats(&self) -> bool {
        matches!(self.list_player_ids().await, Ok(ids) if !ids.is_empty())
    }

    /// Raw per-player statistics. `{}` on any failure -- the file changes
    /// continuously while the server runs and may be mid-write.
    ///
    /// Stat files are written with either bare or hyphenated uuid
    /// basenames depending on the server distribution; both are tried.
    pub async fn read_stats_raw(&self, uuid: &str) -> serde_json::Value {
        for basename in uuid_basenames(uuid) {
            let path = self.stats_dir().join(format!("{basename}.json"));
            if let Ok(bytes) = tokio::fs::read(&path).await {
                return serde_json::from_slice(&bytes).unwrap_or(serde_json::json!({}));
            }
        }
        serde_json::json!({})
    }

    /// Per-player advancement record, `None` on any failure.
    pub async fn read_advancement_record(
        &self,
        uuid: &str,
    ) -> Option<serde_json::Map<String, serde_json::Value>> {
        for basename in uuid_basenames(uuid) {
            let path = self.advancements_dir().join(format!("{basename}.json"));
            if let Ok(bytes) = tokio::fs::read(&path).await {
                return match serde_json::from_slice(&bytes) {
                    Ok(serde_json::Value::Object(map)) => Some(map),
                    _ => None,
                };
            }
        }
        None
    }

    /// Build the identity lookup tables from `usercache.json`.
    ///
    /// A missing or corrupt cache yields empty maps; names then fall back
    /// to raw uuids everywhere.
    pub async fn load_identity_map(&self) -> IdentityMap {
        let rows: Vec<UserCacheRow> =
            read_json_or(&self.data_dir.join("usercache.json"), serde_json::json!([]))
                .await
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .filter_map(|row| serde_json::from_value(row.clone()).ok())
                        .collect()
                })
                .unwrap_or_default();

        let mut map = IdentityMap::default();
        for row in rows {
            let uuid = row.uuid.replace('-', "");
            map.by_name.insert(row.name.clone(), uuid.clone());
            if let Some(seen) = row.expires_on {
                map.last_seen.insert(uuid.clone(), seen);
            }
            map.by_uuid.insert(uuid, row.name);
        }
        map
    }

    /// Read the persisted structure-location cache, `[]` on any failure.
    pub async fn read_structure_locations(&self) -> Vec<StructureLocation> {
        let value = read_json_or(&self.structure_cache_path(), serde_json::json!([])).await;
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Decode `level.dat` into world metadata.
    pub async fn read_world_metadata(&self) -> CoreResult<WorldMetadata> {
        let path = self.world_dir.join("level.dat");
        let bytes = tokio::fs::read(&path).await.map_err(|err| {
            CoreError::DataUnavailable(format!("cannot read {}: {err}", path.display()))
        })?;
        nbt::read_world_metadata(&bytes)
    }
}

/// Candidate stat/advancement basenames for a bare 32-hex uuid: the bare
/// form first, then the 8-4-4-4-12 hyphenated form.
fn uuid_basenames(uuid: &str) -> Vec<String> {
    let mut names = vec![uuid.to_string()];
    if uuid.len() == 32 && uuid.chars().all(|c| c.is_ascii_hexdigit()) {
        names.push(format!(
            "{}-{}-{}-{}-{}",
            &uuid[0..8],
            &uuid[8..12],
            &uuid[12..16],
            &uuid[16..20],
            &uuid[20..32]
        ));
    }
    names
}

/// JSON-decode a file, returning `fallback` on any read or parse failure.
async fn read_json_or(path: &Path, fallback: serde_json::Value) -> serde_json::Value {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or(fallback),
        Err(_) => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> (tempfile::TempDir, SaveData) {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().to_path_buf();
        let world = data.join("world");
        let local = data.join("local");
        std::fs::create_dir_all(world.join("stats")).unwrap();
        std::fs::create_dir_all(world.join("advancements")).unwrap();
        std::fs::create_dir_all(&local).unwrap();
        let save = SaveData::new(&data, &world, &local);
        (dir, save)
    }

    const STEVE: &str = "aaaaaaaabbbbccccddddeeeeeeeeeeee";

    #[tokio::test]
    async fn lists_player_ids_from_stat_basenames() {
        let (_dir, save) = fixture();
        std::fs::write(save.world_dir.join("stats").join(format!("{STEVE}.json")), "{}").unwrap();
        std::fs::write(save.world_dir.join("stats").join("ignored.txt"), "").unwrap();

        let ids = save.list_player_ids().await.unwrap();
        assert_eq!(ids, vec![STEVE.to_string()]);
    }

    #[tokio::test]
    async fn missing_stats_dir_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let save = SaveData::new(dir.path(), dir.path().join("nope"), dir.path());
        assert!(save.list_player_ids().await.unwrap().is_empty());
        assert!(!save.has_stats().await);
    }

    #[tokio::test]
    async fn corrupt_stats_file_degrades_to_empty_object() {
        let (_dir, save) = fixture();
        std::fs::write(
            save.world_dir.join("stats").join(format!("{STEVE}.json")),
            "{not json",
        )
        .unwrap();
        assert_eq!(save.read_stats_raw(STEVE).await, json!({}));
    }

    #[tokio::test]
    async fn stats_read_falls_back_to_hyphenated_basename() {
        let (_dir, save) = fixture();
        std::fs::write(
            save.world_dir
                .join("stats")
                .join("aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee.json"),
            json!({"stats": {"minecraft:custom": {"minecraft:deaths": 3}}}).to_string(),
        )
        .unwrap();
        let raw = save.read_stats_raw(STEVE).await;
        assert_eq!(raw["stats"]["minecraft:custom"]["minecraft:deaths"], 3);
    }

    #[tokio::test]
    async fn missing_advancement_record_is_none() {
        let (_dir, save) = fixture();
        assert!(save.read_advancement_record(STEVE).await.is_none());
    }

    #[tokio::test]
    async fn identity_map_resolves_names_and_uuids() {
        let (_dir, save) = fixture();
        std::fs::write(
            save.data_dir.join("usercache.json"),
            json!([{
                "name": "Steve",
                "uuid": "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee",
                "expiresOn": "2025-11-01 10:00:00 +0000"
            }])
            .to_string(),
        )
        .unwrap();

        let map = save.load_identity_map().await;
        assert_eq!(map.resolve("Steve"), STEVE);
        assert_eq!(map.resolve("aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee"), STEVE);
        assert_eq!(map.resolve(STEVE), STEVE);
        assert_eq!(map.name_for(STEVE), Some("Steve"));
        assert_eq!(map.last_seen_for(STEVE), Some("2025-11-01 10:00:00 +0000"));
        // Unknown names pass through as already-being-a-uuid.
        assert_eq!(map.resolve("Herobrine"), "Herobrine");
    }

    #[tokio::test]
    async fn missing_usercache_gives_empty_maps() {
        let (_dir, save) = fixture();
        let map = save.load_identity_map().await;
        assert!(map.by_uuid.is_empty());
        assert_eq!(map.resolve("Steve"), "Steve");
    }

    #[tokio::test]
    async fn structure_cache_defaults_to_empty() {
        let (_dir, save) = fixture();
        assert!(save.read_structure_locations().await.is_empty());
    }
}
