//! Process-wide short-TTL memoization keyed by logical resource name.
//!
//! Bounds load on the save directory and the RCON connection. There is no
//! eviction beyond per-key TTL (the key cardinality here is a handful of
//! route names plus one key per player). Two concurrent misses for the same
//! key may both perform the underlying read and both write; last write wins.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct CacheEntry {
    value: serde_json::Value,
    inserted: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.inserted) < self.ttl
    }
}

/// Shared TTL cache over final JSON payloads.
///
/// An expired key behaves identically to a never-inserted one.
#[derive(Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key, dropping it if past its TTL.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = Instant::now();
        {
            let entries = self.entries.read().expect("cache lock poisoned");
            match entries.get(key) {
                Some(entry) if entry.is_fresh(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Stale: remove under the write lock so the next miss rebuilds it.
        let mut entries = self.entries.write().expect("cache lock poisoned");
        if let Some(entry) = entries.get(key) {
            if entry.is_fresh(now) {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    /// Insert or replace a key wholesale (entries are never merged).
    pub fn insert(&self, key: impl Into<String>, value: serde_json::Value, ttl: Duration) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(
            key.into(),
            CacheEntry {
                value,
                inserted: Instant::now(),
                ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.remove(key);
    }

    /// Drop every entry (administrative reload).
    pub fn clear(&self) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hit_before_ttl_elapses() {
        let cache = TtlCache::new();
        cache.insert("status", json!({"online": 2}), Duration::from_secs(60));
        assert_eq!(cache.get("status"), Some(json!({"online": 2})));
    }

    #[test]
    fn miss_after_ttl_elapses() {
        let cache = TtlCache::new();
        cache.insert("status", json!(1), Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get("status"), None);
        // Expired key behaves like a never-inserted one.
        assert_eq!(cache.get("status"), None);
    }

    #[test]
    fn insert_replaces_wholesale() {
        let cache = TtlCache::new();
        cache.insert("k", json!({"a": 1, "b": 2}), Duration::from_secs(60));
        cache.insert("k", json!({"a": 9}), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!({"a": 9})));
    }

    #[test]
    fn clear_drops_everything() {
        let cache = TtlCache::new();
        cache.insert("a", json!(1), Duration::from_secs(60));
        cache.insert("b", json!(2), Duration::from_secs(60));
        cache.clear();
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn remove_is_per_key() {
        let cache = TtlCache::new();
        cache.insert("a", json!(1), Duration::from_secs(60));
        cache.insert("b", json!(2), Duration::from_secs(60));
        cache.remove("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(json!(2)));
    }
}
