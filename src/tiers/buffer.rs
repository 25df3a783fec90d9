//! Write-absorbing delta buffer.

use crate::types::CounterKey;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Concurrency-safe accumulator of pending deltas per key.
///
/// Increments are lock-free on the hot path: each key gets a lazily
/// created atomic cell, and concurrent callers contend only on that
/// cell. `drain` atomically moves deltas out, so a delta is observed by
/// exactly one drain cycle.
#[derive(Debug, Default)]
pub struct WriteBuffer {
    pending: DashMap<CounterKey, AtomicU64>,
}

impl WriteBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the pending count for `key`, creating the entry at
    /// zero if absent. Zero deltas are ignored.
    pub fn increment(&self, key: &str, delta: u64) {
        if delta == 0 {
            return;
        }
        self.pending
            .entry(key.to_owned())
            .or_default()
            .fetch_add(delta, Ordering::Relaxed);
    }

    /// Read the pending delta for `key` without consuming it.
    pub fn get(&self, key: &str) -> u64 {
        self.pending
            .get(key)
            .map(|cell| cell.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Snapshot and clear all pending deltas.
    ///
    /// Entries are removed one key at a time; the map serializes each
    /// removal against outstanding increments on the same entry, so a
    /// racing increment lands either in the removed value or in a fresh
    /// entry picked up by the next drain. Never both, never neither.
    pub fn drain(&self) -> HashMap<CounterKey, u64> {
        let keys: Vec<CounterKey> = self.pending.iter().map(|e| e.key().clone()).collect();

        let mut drained = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some((key, cell)) = self.pending.remove(&key) {
                let delta = cell.into_inner();
                if delta > 0 {
                    drained.insert(key, delta);
                }
            }
        }
        drained
    }

    /// Number of keys with pending deltas.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when no deltas are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn increments_accumulate_per_key() {
        let buffer = WriteBuffer::new();

        buffer.increment("k", 3);
        buffer.increment("k", 2);
        buffer.increment("other", 1);

        assert_eq!(buffer.get("k"), 5);
        assert_eq!(buffer.get("other"), 1);
        assert_eq!(buffer.get("missing"), 0);
    }

    #[test]
    fn drain_moves_everything_once() {
        let buffer = WriteBuffer::new();
        buffer.increment("k", 3);
        buffer.increment("k", 2);

        let drained = buffer.drain();
        assert_eq!(drained.get("k"), Some(&5));
        assert_eq!(drained.len(), 1);

        // A later increment starts a fresh cycle, not a merge into the
        // already-drained value.
        buffer.increment("k", 1);
        assert_eq!(buffer.get("k"), 1);

        let second = buffer.drain();
        assert_eq!(second.get("k"), Some(&1));
    }

    #[test]
    fn drain_on_empty_buffer_is_empty() {
        let buffer = WriteBuffer::new();
        assert!(buffer.drain().is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn zero_delta_is_ignored() {
        let buffer = WriteBuffer::new();
        buffer.increment("k", 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn concurrent_increments_are_never_lost() {
        let buffer = Arc::new(WriteBuffer::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let buffer = buffer.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..1_000 {
                    buffer.increment("hot", 1);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(buffer.get("hot"), 8_000);
    }

    #[test]
    fn increments_racing_a_drain_land_in_exactly_one_cycle() {
        let buffer = Arc::new(WriteBuffer::new());
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let buffer = buffer.clone();
                std::thread::spawn(move || {
                    for _ in 0..5_000 {
                        buffer.increment("hot", 1);
                    }
                })
            })
            .collect();

        let mut collected = 0u64;
        // Drain repeatedly while writers are running.
        for _ in 0..50 {
            collected += buffer.drain().get("hot").copied().unwrap_or(0);
        }
        for writer in writers {
            writer.join().unwrap();
        }
        collected += buffer.drain().get("hot").copied().unwrap_or(0);

        assert_eq!(collected, 20_000);
    }
}
