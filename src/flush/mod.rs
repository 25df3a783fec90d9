//! Periodic flush pipelines linking the tiers.
//!
//! Two independent loops: a short-interval buffer-to-cache drain and a
//! longer-interval cache-to-remote drain. Each tick runs its drain and
//! apply to completion before the next tick can start (missed ticks are
//! delayed, not burst), so a pipeline never begins a new drain while the
//! previous snapshot is still being applied.

use crate::config::EngineConfig;
use crate::metrics::EngineMetrics;
use crate::routing::ShardRegistry;
use crate::tiers::{LocalCache, WriteBuffer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};

/// Drives the buffer→cache and cache→remote pipelines.
///
/// Holds no locks across remote I/O: each drain snapshots its source
/// tier and releases it before any store call.
pub struct FlushScheduler {
    buffer: Arc<WriteBuffer>,
    cache: Arc<LocalCache>,
    registry: Arc<ShardRegistry>,
    metrics: Arc<EngineMetrics>,
    remote_timeout: Duration,
}

impl FlushScheduler {
    /// Create a scheduler over the engine's tiers.
    pub fn new(
        buffer: Arc<WriteBuffer>,
        cache: Arc<LocalCache>,
        registry: Arc<ShardRegistry>,
        metrics: Arc<EngineMetrics>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            buffer,
            cache,
            registry,
            metrics,
            remote_timeout: config.remote_timeout,
        }
    }

    /// Run the buffer→cache pipeline until shutdown.
    pub async fn run_buffer_loop(
        self: Arc<Self>,
        period: Duration,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.flush_buffer_to_cache();
                }
                _ = shutdown_rx.recv() => {
                    debug!("buffer flush loop shutting down");
                    break;
                }
            }
        }
    }

    /// Run the cache→remote pipeline until shutdown.
    pub async fn run_remote_loop(
        self: Arc<Self>,
        period: Duration,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.flush_cache_to_remote().await;
                }
                _ = shutdown_rx.recv() => {
                    debug!("remote flush loop shutting down");
                    break;
                }
            }
        }
    }

    /// Drain the write buffer and merge every pending delta into the
    /// local cache. Synchronous and failure-free.
    pub(crate) fn flush_buffer_to_cache(&self) {
        let drained = self.buffer.drain();
        if drained.is_empty() {
            return;
        }

        let keys = drained.len();
        for (key, delta) in drained {
            self.cache.merge(&key, delta);
        }
        self.metrics.buffer_flushes.inc();
        debug!(keys, "flushed write buffer into local cache");
    }

    /// Drain the local cache and apply each value to its shard.
    ///
    /// A failed or timed-out remote increment re-merges its value into
    /// the cache for retry on the next cycle; nothing is dropped. Keys
    /// that cannot be routed are also requeued, with the topology fault
    /// logged at error level.
    pub(crate) async fn flush_cache_to_remote(&self) {
        let drained = self.cache.drain_and_clear();
        if drained.is_empty() {
            return;
        }

        let keys = drained.len();
        for (key, value) in drained {
            match self.registry.resolve(&key) {
                Ok((shard_id, store)) => {
                    let outcome =
                        tokio::time::timeout(self.remote_timeout, store.increment(&key, value))
                            .await;
                    match outcome {
                        Ok(Ok(())) => {
                            self.metrics.remote_increments.inc();
                        }
                        Ok(Err(e)) => {
                            warn!(
                                key = %key,
                                shard = %shard_id,
                                error = %e,
                                "remote increment failed; value requeued"
                            );
                            self.cache.merge(&key, value);
                            self.metrics.remote_failures.inc();
                        }
                        Err(_) => {
                            warn!(
                                key = %key,
                                shard = %shard_id,
                                "remote increment timed out; value requeued"
                            );
                            self.cache.merge(&key, value);
                            self.metrics.remote_failures.inc();
                        }
                    }
                }
                Err(e) => {
                    error!(key = %key, error = %e, "cannot route key; value requeued");
                    self.cache.merge(&key, value);
                    self.metrics.remote_failures.inc();
                }
            }
        }
        self.metrics.remote_flushes.inc();
        debug!(keys, "flushed local cache to remote shards");
    }
}

impl std::fmt::Debug for FlushScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlushScheduler")
            .field("remote_timeout", &self.remote_timeout)
            .finish()
    }
}
