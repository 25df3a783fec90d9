//! Configuration for the counter engine.

use crate::error::{Error, Result};
use std::time::Duration;

/// Main configuration for the counter engine.
///
/// All intervals and bounds are explicit; nothing is hardcoded in the
/// tiers themselves.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the write buffer drains into the local cache.
    pub buffer_flush_interval: Duration,

    /// How often the local cache drains into the remote shards.
    pub cache_flush_interval: Duration,

    /// How long a cache entry may sit without a new merge before it is
    /// considered expired. Sliding: refreshed on every merge.
    pub cache_ttl: Duration,

    /// Maximum number of entries in the local cache. When exceeded, the
    /// least-recently-written entry is evicted.
    pub cache_max_entries: usize,

    /// Ring positions per shard. More replicas smooth the distribution
    /// but grow the ring.
    pub ring_replicas: usize,

    /// Deadline for a single remote store call (both flush increments
    /// and read-path fetches).
    pub remote_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_flush_interval: Duration::from_secs(5),
            cache_flush_interval: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(60),
            cache_max_entries: 100_000,
            ring_replicas: 2,
            remote_timeout: Duration::from_secs(2),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffer-to-cache flush interval.
    pub fn with_buffer_flush_interval(mut self, interval: Duration) -> Self {
        self.buffer_flush_interval = interval;
        self
    }

    /// Set the cache-to-remote flush interval.
    pub fn with_cache_flush_interval(mut self, interval: Duration) -> Self {
        self.cache_flush_interval = interval;
        self
    }

    /// Set the cache entry TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the cache capacity bound.
    pub fn with_cache_max_entries(mut self, max_entries: usize) -> Self {
        self.cache_max_entries = max_entries;
        self
    }

    /// Set the number of ring positions per shard.
    pub fn with_ring_replicas(mut self, replicas: usize) -> Self {
        self.ring_replicas = replicas;
        self
    }

    /// Set the remote call deadline.
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_flush_interval.is_zero() {
            return Err(Error::Config(
                "buffer_flush_interval must be non-zero".to_string(),
            ));
        }
        if self.cache_flush_interval.is_zero() {
            return Err(Error::Config(
                "cache_flush_interval must be non-zero".to_string(),
            ));
        }
        if self.cache_ttl.is_zero() {
            return Err(Error::Config("cache_ttl must be non-zero".to_string()));
        }
        if self.cache_max_entries == 0 {
            return Err(Error::Config(
                "cache_max_entries must be at least 1".to_string(),
            ));
        }
        if self.ring_replicas == 0 {
            return Err(Error::Config(
                "ring_replicas must be at least 1".to_string(),
            ));
        }
        if self.remote_timeout.is_zero() {
            return Err(Error::Config("remote_timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}
