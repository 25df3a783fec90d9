//! Tiered, write-absorbing counter aggregation engine.
//!
//! This crate maintains approximate, eventually consistent counts per
//! key while routing durable state across backing-store shards chosen
//! by a consistent-hash ring. Bursts of increments are absorbed
//! in-process so that write volume never reaches the backing stores
//! directly:
//!
//! - **WriteBuffer** absorbs increments with per-key atomics (fastest tier)
//! - **LocalCache** bridges buffer drains and the slower remote flush
//! - **HashRing** / **ShardRegistry** route each key to one shard
//! - **FlushScheduler** runs the two periodic drain pipelines
//! - **CounterEngine** composes it all behind `increment`/`read`
//!
//! # Example
//!
//! ```rust,no_run
//! use tallyring::{CounterEngine, EngineConfig, MemoryStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> tallyring::Result<()> {
//!     let engine = CounterEngine::new(EngineConfig::default())?;
//!     engine.register_shard("shard-7070", Arc::new(MemoryStore::new()));
//!     engine.register_shard("shard-7071", Arc::new(MemoryStore::new()));
//!     engine.start();
//!
//!     // Fire-and-forget; never blocks on I/O.
//!     engine.increment("page-42");
//!
//!     // Merges buffer + cache + remote; degrades instead of failing
//!     // when the remote tier is unreachable.
//!     let result = engine.read("page-42").await?;
//!     println!("{} ({})", result.value, result.provenance);
//!
//!     engine.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//!  callers ──increment──▶ ┌─────────────┐
//!                         │ WriteBuffer │  per-key atomic deltas
//!                         └──────┬──────┘
//!                     every ~5s  │ drain (atomic move)
//!                         ┌──────▼──────┐
//!                         │ LocalCache  │  bounded, TTL, LRW eviction
//!                         └──────┬──────┘
//!                    every ~30s  │ drain, route, apply (timeout-bounded,
//!                         ┌──────▼──────┐ failures requeued)
//!                         │  HashRing   │──▶ shard "A" store
//!                         │ + Registry  │──▶ shard "B" store
//!                         └─────────────┘
//!
//!  read(key) = buffer[key] + cache[key] + remote[key]
//! ```
//!
//! # Consistency model
//!
//! - `increment` is synchronous, I/O-free and failure-free.
//! - A delta becomes durable after one buffer→cache cycle and one
//!   cache→remote cycle; reads in between are served from the in-memory
//!   tiers and are exact for this process.
//! - Remote failures never drop deltas: the flush pipeline requeues them
//!   into the cache and retries next cycle. Reads degrade to the
//!   in-memory partial sum instead of erroring.
//! - A process crash between drain and remote apply loses the unflushed
//!   window; this is the accepted trade-off of the in-memory tiers.

pub mod config;
pub mod error;
pub mod flush;
pub mod metrics;
pub mod routing;
pub mod service;
pub mod store;
pub mod tiers;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use error::{Error, Result, RoutingError, StoreError};
pub use flush::FlushScheduler;
pub use metrics::{Counter, EngineMetrics, MetricsSnapshot};
pub use routing::{HashRing, ShardRegistry};
pub use service::CounterEngine;
pub use store::{CounterStore, MemoryStore};
pub use tiers::{LocalCache, WriteBuffer};
pub use types::{CounterKey, EngineStats, ReadProvenance, ReadResult, ShardId};
