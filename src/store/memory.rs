//! In-memory counter store.

use crate::error::StoreError;
use crate::store::CounterStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-process [`CounterStore`] backed by a concurrent map.
///
/// Serves as the reference shard implementation for tests and for
/// single-process deployments that want the tiering behavior without a
/// networked store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    counts: DashMap<String, AtomicU64>,
    increments: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous read of a key's accumulated value, for assertions and
    /// monitoring.
    pub fn value(&self, key: &str) -> Option<u64> {
        self.counts.get(key).map(|v| v.load(Ordering::Relaxed))
    }

    /// Number of keys the store has accumulated.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True when the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of increment calls served.
    pub fn increment_calls(&self) -> u64 {
        self.increments.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: &str, delta: u64) -> Result<(), StoreError> {
        self.increments.fetch_add(1, Ordering::Relaxed);
        self.counts
            .entry(key.to_owned())
            .or_default()
            .fetch_add(delta, Ordering::Relaxed);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.value(key))
    }
}
