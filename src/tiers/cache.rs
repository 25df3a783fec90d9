//! Bounded aggregation tier between buffer drains and remote flushes.

use crate::types::CounterKey;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CachedCount {
    value: u64,
    /// Last merge time. TTL is sliding: every merge refreshes it.
    written_at: Instant,
}

/// Bounded, TTL-limited counter cache.
///
/// This tier only bridges flush cycles; it is not a general-purpose
/// cache. Capacity overflow evicts the least-recently-written entry, and
/// entries that sit a full TTL without a merge expire.
///
/// All operations take one short internal lock, so `drain_and_clear` is
/// atomic relative to concurrent `merge` calls.
#[derive(Debug)]
pub struct LocalCache {
    entries: Mutex<HashMap<CounterKey, CachedCount>>,
    max_entries: usize,
    ttl: Duration,
}

impl LocalCache {
    /// Create a cache bounded to `max_entries` with the given sliding TTL.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    /// Add `delta` to the cached value for `key`, creating the entry if
    /// absent and refreshing its TTL. Zero deltas are ignored.
    pub fn merge(&self, key: &str, delta: u64) {
        if delta == 0 {
            return;
        }

        let now = Instant::now();
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get_mut(key) {
            entry.value += delta;
            entry.written_at = now;
            return;
        }

        if entries.len() >= self.max_entries {
            Self::evict_least_recently_written(&mut entries);
        }
        entries.insert(
            key.to_owned(),
            CachedCount {
                value: delta,
                written_at: now,
            },
        );
    }

    /// Read the cached value for `key`, or `None` if absent or expired.
    ///
    /// Expired entries are dropped on observation.
    pub fn get(&self, key: &str) -> Option<u64> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.written_at.elapsed() <= self.ttl => Some(entry.value),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Atomically take all non-expired values and clear the cache.
    ///
    /// Merges racing this call land either in the returned snapshot or
    /// in the freshly emptied cache for the next cycle.
    pub fn drain_and_clear(&self) -> HashMap<CounterKey, u64> {
        let drained = std::mem::take(&mut *self.entries.lock());
        drained
            .into_iter()
            .filter(|(_, entry)| entry.written_at.elapsed() <= self.ttl && entry.value > 0)
            .map(|(key, entry)| (key, entry.value))
            .collect()
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn evict_least_recently_written(entries: &mut HashMap<CounterKey, CachedCount>) {
        if let Some(oldest) = entries
            .iter()
            .min_by_key(|(_, entry)| entry.written_at)
            .map(|(key, _)| key.clone())
        {
            entries.remove(&oldest);
        }
    }
}
