//! Keyed query cache with TTL metadata.
//!
//! An explicit, injectable service: a map from composite string keys to
//! JSON values, each entry carrying its fetch time. Entries are served
//! as fresh for [`STALE_TIME`], as stale (usable, but due for refetch)
//! until [`GC_TIME`], and evicted after that. Mutation handlers are the
//! only writers; readers never mutate entries.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// How long a cached result is served without a network round-trip.
pub const STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// How long a cached result is retained before eviction.
pub const GC_TIME: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    fetched_at: Instant,
    /// Set by mutations; forces the next read to refetch while keeping
    /// the old value available as stale data.
    invalidated: bool,
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    /// Within the stale window and not invalidated; serve directly.
    Fresh(T),
    /// Usable for display, but the caller should refetch.
    Stale(T),
    Miss,
}

/// Process-wide query cache, shared by every entity service.
pub struct QueryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    stale_time: Duration,
    gc_time: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_policy(STALE_TIME, GC_TIME)
    }

    /// Cache with custom freshness/retention windows (tests, tuning).
    pub fn with_policy(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stale_time,
            gc_time,
        }
    }

    /// Key for a single entity record: `"{entity}:{id}"`.
    pub fn detail_key(entity: &str, id: &str) -> String {
        format!("{entity}:{id}")
    }

    /// Key prefix covering all list results for an entity.
    pub fn list_prefix(entity: &str) -> String {
        format!("{entity}-list:")
    }

    /// Key for one list result: `"{entity}-list:{filter suffix}"`.
    pub fn list_key(entity: &str, suffix: &str) -> String {
        format!("{}{}", Self::list_prefix(entity), suffix)
    }

    /// Store a value under a key, resetting its TTL.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to serialize cache value, skipping");
                return;
            }
        };
        self.entries
            .lock()
            .expect("query cache lock poisoned")
            .insert(
                key.to_string(),
                CacheEntry {
                    value,
                    fetched_at: Instant::now(),
                    invalidated: false,
                },
            );
    }

    /// Look up a key, classifying the hit by age. Entries past the
    /// retention window are evicted on the way.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        let mut entries = self.entries.lock().expect("query cache lock poisoned");
        let Some(entry) = entries.get(key) else {
            return CacheLookup::Miss;
        };
        let age = entry.fetched_at.elapsed();
        if age >= self.gc_time {
            entries.remove(key);
            return CacheLookup::Miss;
        }
        let Ok(value) = serde_json::from_value::<T>(entry.value.clone()) else {
            // A shape mismatch means the key is being reused across
            // types; drop the entry rather than serve garbage.
            tracing::warn!(key, "Cached value no longer matches requested type, evicting");
            entries.remove(key);
            return CacheLookup::Miss;
        };
        if entry.invalidated || age >= self.stale_time {
            CacheLookup::Stale(value)
        } else {
            CacheLookup::Fresh(value)
        }
    }

    /// Mark one key for refetch on its next read.
    pub fn invalidate(&self, key: &str) {
        if let Some(entry) = self
            .entries
            .lock()
            .expect("query cache lock poisoned")
            .get_mut(key)
        {
            entry.invalidated = true;
        }
    }

    /// Mark every key under a prefix for refetch (e.g. all list results
    /// of one entity after a mutation).
    pub fn invalidate_prefix(&self, prefix: &str) {
        let mut entries = self.entries.lock().expect("query cache lock poisoned");
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
            }
        }
    }

    /// Drop a key entirely (deleted entities).
    pub fn remove(&self, key: &str) {
        self.entries
            .lock()
            .expect("query cache lock poisoned")
            .remove(key);
    }

    /// Drop everything (logout).
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("query cache lock poisoned")
            .clear();
    }

    /// Evict all entries past the retention window.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().expect("query cache lock poisoned");
        let before = entries.len();
        let gc_time = self.gc_time;
        entries.retain(|_, entry| entry.fetched_at.elapsed() < gc_time);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("query cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
