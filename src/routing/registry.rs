//! Shard registry binding routed shard ids to live store handles.
//!
//! The registry is the sole owner of ring membership: administrative
//! `register`/`remove` calls mutate the ring under a write lock, so they
//! exclude in-flight `resolve` lookups. Counter traffic never mutates
//! topology.

use crate::error::RoutingError;
use crate::routing::HashRing;
use crate::store::CounterStore;
use crate::types::ShardId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

struct RegistryInner {
    ring: HashRing,
    handles: HashMap<ShardId, Arc<dyn CounterStore>>,
}

/// Registry of live shards.
///
/// Administrative-only surface; not on the hot write path.
pub struct ShardRegistry {
    inner: RwLock<RegistryInner>,
}

impl ShardRegistry {
    /// Create an empty registry whose ring uses `replicas` positions per
    /// shard.
    pub fn new(replicas: usize) -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                ring: HashRing::new(replicas),
                handles: HashMap::new(),
            }),
        }
    }

    /// Register a shard and its store handle, adding it to the ring.
    ///
    /// Idempotent by shard id: re-registering replaces the handle but
    /// inserts no new ring positions.
    pub fn register(&self, shard_id: impl Into<ShardId>, handle: Arc<dyn CounterStore>) {
        let shard_id = shard_id.into();
        let mut inner = self.inner.write();
        let replaced = inner.handles.insert(shard_id.clone(), handle).is_some();
        inner.ring.add_shard(shard_id.clone());
        info!(shard = %shard_id, replaced, "registered shard");
    }

    /// Remove a shard from the ring and drop its handle.
    ///
    /// Future writes for keys it owned route to their ring successors;
    /// data already accumulated under the shard is not migrated.
    ///
    /// Returns `false` when the shard was not registered.
    pub fn remove(&self, shard_id: &str) -> bool {
        let mut inner = self.inner.write();
        let removed = inner.handles.remove(shard_id).is_some();
        inner.ring.remove_shard(shard_id);
        if removed {
            info!(shard = %shard_id, "removed shard");
        }
        removed
    }

    /// Resolve a key to its owning shard id and store handle.
    pub fn resolve(&self, key: &str) -> Result<(ShardId, Arc<dyn CounterStore>), RoutingError> {
        let inner = self.inner.read();
        let shard_id = inner.ring.route(key)?;
        // Ring and handle map are mutated under one lock, so a miss here
        // means topology desync; surface it rather than misroute.
        let handle = inner
            .handles
            .get(&shard_id)
            .cloned()
            .ok_or_else(|| RoutingError::UnknownShard(shard_id.clone()))?;
        Ok((shard_id, handle))
    }

    /// Resolve a key to its owning shard id only.
    pub fn shard_for(&self, key: &str) -> Result<ShardId, RoutingError> {
        self.inner.read().ring.route(key)
    }

    /// Number of registered shards.
    pub fn shard_count(&self) -> usize {
        self.inner.read().ring.shard_count()
    }

    /// Ids of all registered shards.
    pub fn shard_ids(&self) -> Vec<ShardId> {
        self.inner.read().ring.shards().to_vec()
    }
}

impl std::fmt::Debug for ShardRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ShardRegistry")
            .field("shards", &inner.ring.shards())
            .field("replicas", &inner.ring.replicas())
            .finish()
    }
}
