//! Key-to-shard routing.
//!
//! [`HashRing`] owns the consistent-hash topology (hashes and shard ids
//! only, never store handles); [`ShardRegistry`] owns the id-to-handle
//! translation and is the sole mutator of ring membership.

pub mod hashring;
pub mod registry;

pub use hashring::HashRing;
pub use registry::ShardRegistry;
