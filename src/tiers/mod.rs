//! In-memory counter tiers.
//!
//! [`WriteBuffer`] is the fastest tier: it absorbs increment bursts with
//! per-key atomics. [`LocalCache`] bridges buffer drains and the slower
//! remote flush. Both are failure-free and do no I/O; only the flush
//! scheduler drains them.

pub mod buffer;
pub mod cache;

pub use buffer::WriteBuffer;
pub use cache::LocalCache;
