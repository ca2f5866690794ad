//! The advancement catalog: every milestone the server knows about, with
//! its parent/dependency links.
//!
//! Built once per process lifetime and memoized. The primary source is the
//! configured server-distribution jar (`data/<ns>/advancement(s)/**.json`);
//! a successful build is persisted to a local snapshot as a best-effort
//! side effect so later runs (or runs without the jar) can load it. With
//! neither source available the catalog is empty and reconciliation
//! degrades to "everything available" per the null-parent rule.

use std::collections::HashSet;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::lang::LangTable;

/// Namespace sub-path that holds recipe-unlock pseudo-advancements; never
/// part of the catalog.
const RECIPES_PREFIX: &str = "recipes/";

/// One advancement definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRow {
    /// Namespaced id, e.g. `minecraft:story/mine_stone`.
    pub id: String,
    /// First path segment after the namespace, e.g. `story`.
    pub category: String,
    pub parent: Option<String>,
    pub title: String,
    pub description: String,
    pub icon_item: Option<String>,
    pub background: Option<String>,
    /// `task` | `goal` | `challenge`.
    pub frame: String,
    pub hidden: bool,
}

/// Memoized catalog builder/loader. Cheap to share behind an `Arc`.
pub struct CatalogService {
    archive_path: Option<PathBuf>,
    snapshot_path: PathBuf,
    lang: Option<LangTable>,
    memo: RwLock<Option<Arc<Vec<CatalogRow>>>>,
}

impl CatalogService {
    pub fn new(archive_path: Option<PathBuf>, snapshot_path: PathBuf, lang: Option<LangTable>) -> Self {
        Self {
            archive_path,
            snapshot_path,
            lang,
            memo: RwLock::new(None),
        }
    }

    /// The full catalog, building it on first use.
    ///
    /// Concurrent first calls may race to build; whichever finishes last
    /// wins the memo slot, which is harmless because every build sees the
    /// same inputs.
    pub async fn get(&self) -> Arc<Vec<CatalogRow>> {
        if let Some(rows) = self.memo.read().await.clone() {
            return rows;
        }
        let rows = Arc::new(self.build().await);
        *self.memo.write().await = Some(Arc::clone(&rows));
        rows
    }

    /// Catalog id set, defensively re-excluding the recipes namespace.
    pub async fn ids(&self) -> HashSet<String> {
        self.get()
            .await
            .iter()
            .filter(|row| !is_recipe_id(&row.id))
            .map(|row| row.id.clone())
            .collect()
    }

    /// Catalog cardinality (recipes excluded), the denominator for
    /// advancement-completion metrics.
    pub async fn total(&self) -> usize {
        self.ids().await.len()
    }

    /// Drop the memo so the next `get` rebuilds (administrative reload).
    pub async fn clear(&self) {
        *self.memo.write().await = None;
    }

    async fn build(&self) -> Vec<CatalogRow> {
        if let Some(archive) = self.archive_path.clone() {
            let lang = self.lang.clone();
            let built = tokio::task::spawn_blocking(move || extract_from_archive(&archive, lang.as_ref()))
                .await
                .unwrap_or_else(|err| Err(CoreError::Archive(err.to_string())));
            match built {
                Ok(rows) if !rows.is_empty() => {
                    self.persist_snapshot(&rows).await;
                    return rows;
                }
                Ok(_) => {
                    tracing::warn!("archive scan produced no advancement definitions, using snapshot");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "archive scan failed, falling back to snapshot");
                }
            }
        }
        self.load_snapshot().await.unwrap_or_default()
    }

    /// Best-effort snapshot write; failure is logged, never propagated.
    async fn persist_snapshot(&self, rows: &[CatalogRow]) {
        let payload = match serde_json::to_vec_pretty(rows) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "cannot serialize catalog snapshot");
                return;
            }
        };
        if let Some(parent) = self.snapshot_path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        if let Err(err) = tokio::fs::write(&self.snapshot_path, payload).await {
            tracing::warn!(
                error = %err,
                path = %self.snapshot_path.display(),
                "cannot persist catalog snapshot"
            );
        }
    }

    async fn load_snapshot(&self) -> Option<Vec<CatalogRow>> {
        let bytes = tokio::fs::read(&self.snapshot_path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(rows) => Some(rows),
            Err(err) => {
                tracing::warn!(error = %err, "corrupt catalog snapshot ignored");
                None
            }
        }
    }
}

fn is_recipe_id(id: &str) -> bool {
    id.split_once(':')
        .map(|(_ns, path)| path.starts_with(RECIPES_PREFIX))
        .unwrap_or(false)
}

/// Scan the jar for advancement definitions and project them into rows.
///
/// Entries without a `display` block are internal/technical advancements
/// and are excluded entirely; malformed JSON entries are skipped.
fn extract_from_archive(archive_path: &std::path::Path, lang: Option<&LangTable>) -> CoreResult<Vec<CatalogRow>> {
    let file = std::fs::File::open(archive_path)
        .map_err(|err| CoreError::Archive(format!("{}: {err}", archive_path.display())))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|err| CoreError::Archive(err.to_string()))?;

    let mut rows = Vec::new();
    for index in 0..zip.len() {
        let mut entry = match zip.by_index(index) {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        let Some((namespace, rel_path)) = advancement_entry(entry.name()) else {
            continue;
        };
        if rel_path.starts_with(RECIPES_PREFIX) {
            continue;
        }

        let mut text = String::new();
        if entry.read_to_string(&mut text).is_err() {
            continue;
        }
        let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) else {
            continue;
        };
        let Some(display) = json.get("display") else {
            continue;
        };

        let id = format!("{namespace}:{rel_path}");
        let category = rel_path.split('/').next().unwrap_or("").to_string();
        rows.push(CatalogRow {
            id,
            category,
            parent: json.get("parent").and_then(|p| p.as_str()).map(str::to_owned),
            title: display_text(display.get("title"), lang).unwrap_or(rel_path.clone()),
            description: display_text(display.get("description"), lang).unwrap_or_default(),
            icon_item: display
                .pointer("/icon/item")
                .or_else(|| display.pointer("/icon/id"))
                .and_then(|v| v.as_str())
                .map(str::to_owned),
            background: display.get("background").and_then(|v| v.as_str()).map(str::to_owned),
            frame: display
                .get("frame")
                .and_then(|v| v.as_str())
                .unwrap_or("task")
                .to_string(),
            hidden: display.get("hidden").and_then(|v| v.as_bool()).unwrap_or(false),
        });
    }

    rows.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(rows)
}

/// `data/<ns>/advancement/<path>.json` (or the pre-1.21 plural form) ->
/// `(namespace, path)`.
fn advancement_entry(entry_name: &str) -> Option<(String, String)> {
    let rest = entry_name.strip_prefix("data/")?;
    let (namespace, rest) = rest.split_once('/')?;
    let rel_path = rest
        .strip_prefix("advancements/")
        .or_else(|| rest.strip_prefix("advancement/"))?;
    let rel_path = rel_path.strip_suffix(".json")?;
    Some((namespace.to_string(), rel_path.to_string()))
}

/// Title/description values are either literal strings or
/// `{"translate": "<key>"}` components.
fn display_text(value: Option<&serde_json::Value>, lang: Option<&LangTable>) -> Option<String> {
    let value = value?;
    if let Some(text) = value.as_str() {
        return Some(text.to_string());
    }
    let key = value.get("translate").and_then(|k| k.as_str())?;
    Some(match lang {
        Some(table) => table.resolve(key, &[]),
        None => key.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn fixture_jar(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("server.jar");
        let file = std::fs::File::create(&path).unwrap();
        let mut jar = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        let mut add = |name: &str, body: &str| {
            jar.start_file(name, options).unwrap();
            jar.write_all(body.as_bytes()).unwrap();
        };

        add(
            "data/minecraft/advancement/story/root.json",
            r#"{"display":{"title":{"translate":"advancements.story.root.title"},"description":"The heart of the game","icon":{"id":"minecraft:grass_block"},"background":"minecraft:textures/stone.png"}}"#,
        );
        add(
            "data/minecraft/advancement/story/mine_stone.json",
            r#"{"parent":"minecraft:story/root","display":{"title":"Stone Age","description":"Mine stone","frame":"task"}}"#,
        );
        add(
            "data/minecraft/advancement/end/kill_dragon.json",
            r#"{"parent":"minecraft:end/root","display":{"title":"Free the End","description":"","frame":"challenge","hidden":true}}"#,
        );
        // Recipe pseudo-advancements and display-less internals are skipped.
        add(
            "data/minecraft/advancement/recipes/misc/stick.json",
            r#"{"parent":"minecraft:recipes/root"}"#,
        );
        add(
            "data/minecraft/advancement/story/technical.json",
            r#"{"parent":"minecraft:story/root"}"#,
        );
        add("data/minecraft/advancement/story/broken.json", "{oops");
        add("assets/minecraft/textures/ignored.png", "png");

        jar.finish().unwrap();
        path
    }

    fn service(dir: &std::path::Path, with_archive: bool) -> CatalogService {
        let archive = with_archive.then(|| fixture_jar(dir));
        CatalogService::new(archive, dir.join("catalog.json"), None)
    }

    #[tokio::test]
    async fn builds_sorted_catalog_from_archive() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = service(dir.path(), true);
        let rows = catalog.get().await;

        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "minecraft:end/kill_dragon",
                "minecraft:story/mine_stone",
                "minecraft:story/root",
            ]
        );

        let root = rows.iter().find(|r| r.id == "minecraft:story/root").unwrap();
        // No lang table loaded: translate keys fall through as keys.
        assert_eq!(root.title, "advancements.story.root.title");
        assert_eq!(root.category, "story");
        assert_eq!(root.parent, None);
        assert_eq!(root.icon_item.as_deref(), Some("minecraft:grass_block"));

        let dragon = rows.iter().find(|r| r.id == "minecraft:end/kill_dragon").unwrap();
        assert_eq!(dragon.frame, "challenge");
        assert!(dragon.hidden);
        assert_eq!(dragon.parent.as_deref(), Some("minecraft:end/root"));
    }

    #[tokio::test]
    async fn translate_keys_resolve_through_lang_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut entries = std::collections::HashMap::new();
        entries.insert("advancements.story.root.title".to_string(), "Minecraft".to_string());
        let catalog = CatalogService::new(
            Some(fixture_jar(dir.path())),
            dir.path().join("catalog.json"),
            Some(LangTable::from_map(entries)),
        );

        let rows = catalog.get().await;
        let root = rows.iter().find(|r| r.id == "minecraft:story/root").unwrap();
        assert_eq!(root.title, "Minecraft");
    }

    #[tokio::test]
    async fn snapshot_round_trips_the_id_set() {
        let dir = tempfile::tempdir().unwrap();

        let built = service(dir.path(), true);
        let built_ids = built.ids().await;
        assert!(!built_ids.is_empty());

        // Same snapshot path, no archive: must reload the persisted rows.
        let reloaded = service(dir.path(), false);
        assert_eq!(reloaded.ids().await, built_ids);
    }

    #[tokio::test]
    async fn no_sources_yields_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = service(dir.path(), false);
        assert!(catalog.get().await.is_empty());
        assert_eq!(catalog.total().await, 0);
    }

    #[tokio::test]
    async fn get_memoizes_until_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let jar = fixture_jar(dir.path());
        let catalog = CatalogService::new(Some(jar.clone()), dir.path().join("catalog.json"), None);

        let first = catalog.get().await;
        std::fs::remove_file(&jar).unwrap();
        // Memoized: the deleted jar is not re-read.
        assert_eq!(catalog.get().await.len(), first.len());

        catalog.clear().await;
        // Rebuild falls back to the snapshot written by the first build.
        assert_eq!(catalog.get().await.len(), first.len());
    }

    #[test]
    fn recipe_ids_are_recognized() {
        assert!(is_recipe_id("minecraft:recipes/misc/stick"));
        assert!(!is_recipe_id("minecraft:story/mine_stone"));
    }
}
