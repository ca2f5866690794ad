//! Parser for the RCON `list` reply.
//!
//! Different server distributions format this reply differently (vanilla,
//! Paper/Spigot, some plugins), so parsing is an ordered sequence of
//! permissive pattern attempts rather than one strict grammar:
//!
//! 1. `Players (2/20): Steve, Alex`
//! 2. `There are 2 of a max of 20 players online: Steve, Alex`
//!    (names clause omitted when nobody is online)
//! 3. a bare `2/20` anywhere in the text (roster unavailable)
//!
//! Color/formatting escapes (`§x`, `&x`) are stripped first. Unparseable
//! text degrades to zeros with a diagnostic tag -- never an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"§[0-9A-FK-ORa-fk-or]|&[0-9A-FK-ORa-fk-or]").expect("valid regex")
});

static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Players\s*\((\d+)\s*/\s*(\d+)\)\s*:\s*(.*)$").expect("valid regex")
});

static VANILLA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)There are\s+(\d+)\s+of a max of\s+(\d+)\s+players online:? ?(.*)$")
        .expect("valid regex")
});

static BARE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").expect("valid regex"));

/// Parsed occupancy as reported over RCON.
///
/// `raw` is a diagnostic tag telling the consumer which stage produced the
/// numbers (`rcon:list`, `rcon:list:unparsed:<text>`, or -- set by callers
/// running the fallback chain -- `ping` / `offline`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerListStatus {
    pub online: u32,
    pub max: u32,
    pub names: Vec<String>,
    pub raw: String,
}

impl PlayerListStatus {
    /// All-zero occupancy with the given diagnostic tag.
    pub fn offline(tag: impl Into<String>) -> Self {
        Self {
            online: 0,
            max: 0,
            names: Vec::new(),
            raw: tag.into(),
        }
    }
}

/// Remove `§x` color codes and the common `&x` alternates.
pub fn strip_color_codes(text: &str) -> String {
    COLOR_RE.replace_all(text, "").into_owned()
}

/// Parse a `list` reply, trying each known dialect in order.
pub fn parse_list_output(reply: &str) -> PlayerListStatus {
    let cleaned = strip_color_codes(reply).trim().to_string();

    for pattern in [&*PAREN_RE, &*VANILLA_RE] {
        if let Some(caps) = pattern.captures(&cleaned) {
            let online: u32 = caps[1].parse().unwrap_or(0);
            let max: u32 = caps[2].parse().unwrap_or(0);
            let names = if online > 0 {
                split_names(caps.get(3).map_or("", |m| m.as_str()))
            } else {
                Vec::new()
            };
            return PlayerListStatus {
                online,
                max,
                names,
                raw: "rcon:list".to_string(),
            };
        }
    }

    if let Some(caps) = BARE_RE.captures(&cleaned) {
        return PlayerListStatus {
            online: caps[1].parse().unwrap_or(0),
            max: caps[2].parse().unwrap_or(0),
            names: Vec::new(),
            raw: "rcon:list".to_string(),
        };
    }

    PlayerListStatus::offline(format!("rcon:list:unparsed:{cleaned}"))
}

fn split_names(clause: &str) -> Vec<String> {
    clause
        .split(',')
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
