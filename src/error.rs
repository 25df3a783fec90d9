//! Error types for the counter engine.

use crate::types::ShardId;
use thiserror::Error;

/// Result type alias for counter engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the counter engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Key-to-shard routing errors. These are topology faults and are
    /// always surfaced; silently defaulting a route would misdirect
    /// counts to the wrong shard.
    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),

    /// Backing-store errors. Transient by contract; the flush pipelines
    /// absorb them and retry on the next cycle.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),

    /// A remote call exceeded its deadline.
    #[error("remote call timed out")]
    Timeout,
}

/// Key-to-shard routing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// No shards are registered on the ring.
    #[error("hash ring is empty: no shards registered")]
    EmptyRing,

    /// The ring routed to a shard id with no registered store handle.
    #[error("shard not registered: {0}")]
    UnknownShard(ShardId),
}

/// Backing-store errors, as reported by [`CounterStore`] implementations.
///
/// [`CounterStore`]: crate::store::CounterStore
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An I/O error from the store transport.
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
}
