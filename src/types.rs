//! Core types used throughout the counter engine.

use serde::{Deserialize, Serialize};

/// Key identifying one countable entity (a page, a video, a route).
///
/// Keys are opaque: the engine only hashes and compares them.
pub type CounterKey = String;

/// Identifier naming one backing-store shard.
pub type ShardId = String;

/// Which tier ultimately satisfied a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadProvenance {
    /// Only the in-process write buffer held a value; the remote store
    /// had never seen this key.
    BufferOnly,
    /// The local cache tier contributed and the remote store had no value.
    CacheHit,
    /// The remote store answered with an accumulated value.
    RemoteHit,
    /// The remote store was unreachable; the value reflects only the
    /// in-memory tiers.
    Degraded,
}

impl std::fmt::Display for ReadProvenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadProvenance::BufferOnly => write!(f, "buffer-only"),
            ReadProvenance::CacheHit => write!(f, "cache-hit"),
            ReadProvenance::RemoteHit => write!(f, "remote-hit"),
            ReadProvenance::Degraded => write!(f, "degraded"),
        }
    }
}

/// Result of a merged read across all tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResult {
    /// Sum of buffer, cache and remote values (remote omitted when degraded).
    pub value: u64,
    /// Which tier satisfied the read.
    pub provenance: ReadProvenance,
    /// The shard consulted for the remote portion, when routing succeeded.
    pub shard: Option<ShardId>,
}

impl ReadResult {
    /// True when the value reflects only in-memory state.
    pub fn is_degraded(&self) -> bool {
        self.provenance == ReadProvenance::Degraded
    }
}

/// Point-in-time view of engine state, for monitoring.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    /// Keys currently pending in the write buffer.
    pub buffer_keys: usize,
    /// Entries currently held in the local cache tier.
    pub cache_entries: usize,
    /// Registered shard count.
    pub shard_count: usize,
    /// Metric counters accumulated since startup.
    pub metrics: crate::metrics::MetricsSnapshot,
}
