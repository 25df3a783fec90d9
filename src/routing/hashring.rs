//! Consistent hashing ring with replica entries.
//!
//! Each shard is represented by multiple positions on the ring so keys
//! spread evenly across shards, and adding or removing one shard only
//! remaps the keys adjacent to its positions.

use crate::error::RoutingError;
use crate::types::ShardId;
use std::collections::BTreeMap;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// A consistent hash ring mapping keys to shard ids.
///
/// The ring holds only hashes and shard ids; binding shard ids to live
/// store handles is the [`ShardRegistry`]'s job.
///
/// [`ShardRegistry`]: crate::routing::ShardRegistry
#[derive(Debug, Clone)]
pub struct HashRing {
    /// Ring positions mapped to their owning shard, ordered by hash.
    entries: BTreeMap<u64, ShardId>,

    /// Number of ring positions per shard.
    replicas: usize,

    /// Shards currently on the ring.
    shards: Vec<ShardId>,
}

impl HashRing {
    /// Create an empty ring with the given replica count per shard.
    pub fn new(replicas: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            replicas: replicas.max(1),
            shards: Vec::new(),
        }
    }

    /// Number of ring positions per shard.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Number of shards on the ring.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Number of positions on the ring.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// All shards on the ring.
    pub fn shards(&self) -> &[ShardId] {
        &self.shards
    }

    /// Check whether a shard is on the ring.
    pub fn contains_shard(&self, shard_id: &str) -> bool {
        self.shards.iter().any(|s| s == shard_id)
    }

    /// Add a shard to the ring, inserting one position per replica.
    ///
    /// Idempotent: re-adding a known shard id inserts nothing, so ring
    /// size never grows with repeated registration.
    pub fn add_shard(&mut self, shard_id: impl Into<ShardId>) {
        let shard_id = shard_id.into();
        if self.contains_shard(&shard_id) {
            return;
        }

        for i in 0..self.replicas {
            let hash = Self::hash_bytes(Self::replica_key(&shard_id, i).as_bytes());
            self.entries.insert(hash, shard_id.clone());
        }
        self.shards.push(shard_id);
        self.shards.sort();
    }

    /// Remove a shard and all of its ring positions.
    ///
    /// Keys previously owned by this shard route to their successors on
    /// the next lookup; nothing else remaps.
    pub fn remove_shard(&mut self, shard_id: &str) {
        if !self.contains_shard(shard_id) {
            return;
        }

        for i in 0..self.replicas {
            let hash = Self::hash_bytes(Self::replica_key(shard_id, i).as_bytes());
            self.entries.remove(&hash);
        }
        self.shards.retain(|s| s != shard_id);
    }

    /// Route a key to its owning shard.
    ///
    /// Hashes the key and walks clockwise to the first ring position at
    /// or past that hash, wrapping to the lowest position when the key
    /// hashes beyond the highest one. Deterministic for a fixed topology.
    pub fn route(&self, key: &str) -> Result<ShardId, RoutingError> {
        let hash = Self::hash_bytes(key.as_bytes());
        self.entries
            .range(hash..)
            .next()
            .or_else(|| self.entries.iter().next())
            .map(|(_, shard_id)| shard_id.clone())
            .ok_or(RoutingError::EmptyRing)
    }

    /// Route a large synthetic key sample and count keys per shard.
    ///
    /// Useful for verifying balance and remap behavior in tests and
    /// operational tooling.
    pub fn distribution(&self, sample_size: usize) -> std::collections::HashMap<ShardId, usize> {
        let mut distribution = std::collections::HashMap::new();
        for i in 0..sample_size {
            let key = format!("sample-key-{i}");
            if let Ok(shard) = self.route(&key) {
                *distribution.entry(shard).or_insert(0) += 1;
            }
        }
        distribution
    }

    /// Replica position key: shard id suffixed with the replica index.
    fn replica_key(shard_id: &str, index: usize) -> String {
        format!("{shard_id}-{index}")
    }

    /// Hash bytes with XxHash64, seed 0. Unseeded and deterministic so
    /// routing is reproducible across restarts.
    fn hash_bytes(bytes: &[u8]) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(bytes);
        hasher.finish()
    }
}
