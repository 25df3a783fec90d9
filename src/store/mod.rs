//! Backing-store collaborator contract.
//!
//! The engine treats each shard as an opaque service offering
//! at-least-once `increment` and `get`. Real deployments back this with
//! a networked store; [`MemoryStore`] is the in-process reference
//! implementation.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use async_trait::async_trait;

/// One backing-store shard holding authoritative accumulated counts.
///
/// Implementations must tolerate at-least-once delivery: the flush
/// pipeline re-sends a value when an increment fails or times out, and
/// no idempotency is assumed.
#[async_trait]
pub trait CounterStore: Send + Sync + std::fmt::Debug {
    /// Add `delta` to the accumulated count for `key`, creating it at
    /// zero if absent.
    async fn increment(&self, key: &str, delta: u64) -> Result<(), StoreError>;

    /// Fetch the accumulated count for `key`, or `None` if the store has
    /// never seen it.
    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError>;
}
