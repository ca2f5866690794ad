//! Recent-event extraction from the server's latest log file.
//!
//! Tails `logs/latest.log` backwards, classifying join/leave/death/
//! advancement/chat lines until the limit is reached, then returns them
//! oldest-first. A missing or unreadable log yields an empty list.

use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

static TS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\d{4}-\d{2}-\d{2} [^\]]+?)\]").expect("valid regex"));
static JOIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]:\s(.+?)\sjoined the game").expect("valid regex"));
static LEAVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]:\s(.+?)\sleft the game").expect("valid regex"));
static DEATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\]:\s([A-Za-z0-9_]+)\s(?:was|fell|drowned|blew up|tried to swim|burned|went|died|starved|suffocated|experienced|hit the ground)")
        .expect("valid regex")
});
static ADVANCEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\]:\s(.+?)\s(?:has made the advancement|has reached the goal|has completed the challenge)\s\[(.+?)\]")
        .expect("valid regex")
});
static CHAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]:\s<(.+?)>\s(.+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Join,
    Leave,
    Death,
    Advancement,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentEvent {
    /// ISO-8601 timestamp parsed from the log line (current time when the
    /// line carries none).
    pub ts: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: String,
}

/// Clamp a requested event limit into `[1, MAX_LIMIT]`.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Read up to `limit` classified events from the newest server log,
/// oldest-first.
pub async fn read_recent_events(data_dir: &Path, limit: usize) -> Vec<RecentEvent> {
    let path = data_dir.join("logs").join("latest.log");
    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(_) => return Vec::new(),
    };
    classify_lines(&text, limit)
}

fn classify_lines(text: &str, limit: usize) -> Vec<RecentEvent> {
    let mut events = Vec::new();
    for line in text.trim_end().lines().rev() {
        if events.len() >= limit {
            break;
        }
        if let Some(event) = classify_line(line) {
            events.push(event);
        }
    }
    events.reverse();
    events
}

fn classify_line(line: &str) -> Option<RecentEvent> {
    let ts = line_timestamp(line);

    if let Some(caps) = JOIN_RE.captures(line) {
        return Some(RecentEvent {
            ts,
            kind: EventKind::Join,
            message: format!("{} joined the game", &caps[1]),
        });
    }
    if let Some(caps) = LEAVE_RE.captures(line) {
        return Some(RecentEvent {
            ts,
            kind: EventKind::Leave,
            message: format!("{} left the game", &caps[1]),
        });
    }
    if let Some(caps) = ADVANCEMENT_RE.captures(line) {
        return Some(RecentEvent {
            ts,
            kind: EventKind::Advancement,
            message: format!("{} -> [{}]", &caps[1], &caps[2]),
        });
    }
    if DEATH_RE.is_match(line) {
        let message = line.rsplit("]: ").next().unwrap_or(line).to_string();
        return Some(RecentEvent {
            ts,
            kind: EventKind::Death,
            message,
        });
    }
    if let Some(caps) = CHAT_RE.captures(line) {
        return Some(RecentEvent {
            ts,
            kind: EventKind::Chat,
            message: format!("<{}> {}", &caps[1], &caps[2]),
        });
    }
    None
}

fn line_timestamp(line: &str) -> String {
    TS_RE
        .captures(line)
        .and_then(|caps| NaiveDateTime::parse_from_str(&caps[1], "%Y-%m-%d %H:%M:%S").ok())
        .map(|dt| format!("{}Z", dt.format("%Y-%m-%dT%H:%M:%S")))
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string())
}
