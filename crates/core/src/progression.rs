//! World-wide progression: the union of every player's advancement record.
//!
//! Scans the whole advancements directory, collecting non-recipe
//! completions and the boss/dimension milestone flags. The total comes
//! from the catalog when available, falling back to the observed
//! non-recipe id count. Broken per-player files are skipped.

use std::collections::HashSet;

use serde::Serialize;

use crate::advancements::completion_time;
use crate::catalog::CatalogService;
use crate::rcon::RconClient;
use crate::save::SaveData;
use crate::structures;

const RECIPES_PREFIX: &str = "minecraft:recipes/";

const KILL_DRAGON: &str = "minecraft:end/kill_dragon";
const SUMMON_WITHER: &str = "minecraft:nether/summon_wither";
const ENTER_NETHER: &str = "minecraft:story/enter_the_nether";
const ENTER_END: &str = "minecraft:story/enter_the_end";

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BossProgress {
    pub ender_dragon: bool,
    pub wither: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AdvancementProgress {
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionProgress {
    pub overworld: bool,
    pub nether: bool,
    pub end: bool,
}

impl Default for DimensionProgress {
    fn default() -> Self {
        Self {
            overworld: true,
            nether: false,
            end: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureSummary {
    pub id: String,
    pub name: String,
    pub x: i64,
    pub z: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WorldProgression {
    pub bosses: BossProgress,
    pub advancements: AdvancementProgress,
    pub structures: Vec<StructureSummary>,
    pub dimensions: DimensionProgress,
}

/// Compute cross-player progression.
pub async fn compute(save: &SaveData, catalog: &CatalogService, rcon: &RconClient) -> WorldProgression {
    let player_ids = save.list_player_ids().await.unwrap_or_default();

    let mut completed: HashSet<String> = HashSet::new();
    let mut observed_non_recipe: HashSet<String> = HashSet::new();

    let records = futures::future::join_all(
        player_ids.iter().map(|uuid| save.read_advancement_record(uuid)),
    )
    .await;

    for record in records.into_iter().flatten() {
        for (id, value) in &record {
            if id.starts_with(RECIPES_PREFIX) {
                continue;
            }
            observed_non_recipe.insert(id.clone());
            if completion_time(value).is_some() {
                completed.insert(id.clone());
            }
        }
    }

    let catalog_total = catalog.total().await;
    let total = if catalog_total > 0 {
        catalog_total
    } else {
        observed_non_recipe.len()
    };

    let structures = structures::scan(rcon, save, false)
        .await
        .into_iter()
        .map(|loc| StructureSummary {
            id: loc.id,
            name: loc.name,
            x: loc.x,
            z: loc.z,
        })
        .collect();

    WorldProgression {
        bosses: BossProgress {
            ender_dragon: completed.contains(KILL_DRAGON),
            wither: completed.contains(SUMMON_WITHER),
        },
        advancements: AdvancementProgress {
            completed: completed.len(),
            total,
        },
        structures,
        dimensions: DimensionProgress {
            overworld: true,
            nether: completed.contains(ENTER_NETHER),
            end: completed.contains(ENTER_END),
        },
    }
}
