//! In-memory TTL cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use super::clock::{Clock, SystemClock};

#[derive(Clone)]
struct CacheEntry {
    value: String,
    created_at: Instant,
}

/// Process-wide string cache with a single TTL.
///
/// Growth is unbounded; an entry is only dropped when a read finds it expired.
/// Concurrent writers to the same key race with last-write-wins, which is fine
/// for idempotent values such as formatted search results.
pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
            match entries.get(key) {
                None => return None,
                Some(entry) if now.saturating_duration_since(entry.created_at) <= self.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        // re-check: a writer may have refreshed the entry in between
        if let Some(entry) = entries.get(key) {
            if now.saturating_duration_since(entry.created_at) <= self.ttl {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let entry = CacheEntry {
            value: value.into(),
            created_at: self.clock.now(),
        };
        self.entries
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.into(), entry);
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("len", &self.len())
            .finish()
    }
}
