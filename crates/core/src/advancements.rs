//! Reconciliation of a player's advancement record against the catalog.
//!
//! The on-disk record maps advancement id to one of several ad hoc
//! completion-evidence shapes; [`CompletionEvidence`] names them explicitly
//! and a single total reduction ([`CompletionEvidence::completed_at`])
//! collapses any of them to an effective completion time. Reconciliation
//! then labels every catalog row done/available/locked using a one-hop
//! parent check -- deliberately NOT a transitive-closure walk. Only the
//! immediate parent is consulted; the domain's dependency trees are shallow
//! and deeper resolution would change observable labels.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::catalog::CatalogRow;

/// Completion evidence as persisted by the game, one variant per shape
/// observed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEvidence {
    /// An explicit completion timestamp.
    Timestamp(String),
    /// Per-criterion timestamps; the lexicographic max is the effective
    /// completion time (the strings are ISO-8601-like and sort correctly).
    CriteriaMap(BTreeMap<String, String>),
    /// A list of "granted" timestamps, reduced the same way.
    GrantedList(Vec<String>),
    /// A bare `done: true` with no timestamp at all.
    BooleanDone,
}

impl CompletionEvidence {
    /// Classify one raw record entry. `None` means "not attempted".
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if let Some(done) = value.get("done") {
            if let Some(when) = done.as_str() {
                return Some(CompletionEvidence::Timestamp(when.to_string()));
            }
        }
        if let Some(criteria) = value.get("criteria").and_then(|c| c.as_object()) {
            let times: BTreeMap<String, String> = criteria
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect();
            if !times.is_empty() {
                return Some(CompletionEvidence::CriteriaMap(times));
            }
        }
        if let Some(granted) = value.get("granted").and_then(|g| g.as_array()) {
            let times: Vec<String> = granted
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect();
            if !times.is_empty() {
                return Some(CompletionEvidence::GrantedList(times));
            }
        }
        if value.get("done").and_then(|d| d.as_bool()) == Some(true) {
            return Some(CompletionEvidence::BooleanDone);
        }
        None
    }

    /// Total reduction to the effective completion time. `BooleanDone`
    /// yields the `"true"` sentinel so the row still counts as completed.
    pub fn completed_at(&self) -> String {
        match self {
            CompletionEvidence::Timestamp(when) => when.clone(),
            CompletionEvidence::CriteriaMap(times) => {
                times.values().max().cloned().unwrap_or_default()
            }
            CompletionEvidence::GrantedList(times) => {
                times.iter().max().cloned().unwrap_or_default()
            }
            CompletionEvidence::BooleanDone => "true".to_string(),
        }
    }
}

/// Effective completion time for one raw record entry, if any.
pub fn completion_time(value: &serde_json::Value) -> Option<String> {
    CompletionEvidence::from_value(value).map(|evidence| evidence.completed_at())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvancementState {
    Done,
    Available,
    Locked,
}

impl AdvancementState {
    /// Sort rank: locked < available < done, surfacing actionable and
    /// blocked items before already-completed ones.
    fn rank(self) -> u8 {
        match self {
            AdvancementState::Locked => 0,
            AdvancementState::Available => 1,
            AdvancementState::Done => 2,
        }
    }
}

/// One reconciled catalog row for a specific player.
#[derive(Debug, Clone, Serialize)]
pub struct AdvancementRow {
    pub id: String,
    pub title: String,
    pub parent: Option<String>,
    pub done: bool,
    pub when: Option<String>,
    pub state: AdvancementState,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvancementReport {
    pub total: usize,
    pub done: usize,
    pub rows: Vec<AdvancementRow>,
}

/// A completed advancement with its effective time, for "recent" lists.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedAdvancement {
    pub id: String,
    pub when: String,
}

/// Reconcile a player's record against the catalog.
///
/// State rules, per row: `done` if its evidence reduces to a time;
/// otherwise `available` iff the parent is null or itself done; otherwise
/// `locked`. A parent id that does not exist in the catalog is treated as
/// not done, so its children stay `locked` -- an unknown ancestor cannot
/// be presumed satisfied. Rows sort locked, available, done, then by id.
pub fn reconcile(
    record: Option<&serde_json::Map<String, serde_json::Value>>,
    catalog: &[CatalogRow],
) -> AdvancementReport {
    let mut rows: Vec<AdvancementRow> = catalog
        .iter()
        .map(|entry| {
            let when = record
                .and_then(|map| map.get(&entry.id))
                .and_then(completion_time);
            AdvancementRow {
                id: entry.id.clone(),
                title: if entry.title.is_empty() {
                    entry.id.clone()
                } else {
                    entry.title.clone()
                },
                parent: entry.parent.clone(),
                done: when.is_some(),
                when,
                state: AdvancementState::Locked, // filled in below
            }
        })
        .collect();

    // Owned ids: the loop below needs `rows` mutably.
    let done_set: HashSet<String> = rows
        .iter()
        .filter(|row| row.done)
        .map(|row| row.id.clone())
        .collect();

    for row in &mut rows {
        row.state = if row.done {
            AdvancementState::Done
        } else {
            match &row.parent {
                None => AdvancementState::Available,
                Some(parent) if done_set.contains(parent) => AdvancementState::Available,
                Some(_) => AdvancementState::Locked,
            }
        };
    }

    rows.sort_by(|a, b| a.state.rank().cmp(&b.state.rank()).then_with(|| a.id.cmp(&b.id)));

    let done = rows.iter().filter(|row| row.done).count();
    AdvancementReport {
        total: rows.len(),
        done,
        rows,
    }
}

/// All completed entries of a raw record, newest first. Recipe-unlock
/// pseudo-advancements are excluded.
pub fn completed_entries(
    record: Option<&serde_json::Map<String, serde_json::Value>>,
) -> Vec<CompletedAdvancement> {
    let Some(record) = record else {
        return Vec::new();
    };
    let mut entries: Vec<CompletedAdvancement> = record
        .iter()
        .filter(|(id, _)| {
            !id.split_once(':')
                .map(|(_, path)| path.starts_with("recipes/"))
                .unwrap_or(false)
        })
        .filter_map(|(id, value)| {
            completion_time(value).map(|when| CompletedAdvancement {
                id: id.clone(),
                when,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.when.cmp(&a.when).then_with(|| a.id.cmp(&b.id)));
    entries
}
