//! The counter engine façade.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::flush::FlushScheduler;
use crate::metrics::EngineMetrics;
use crate::routing::ShardRegistry;
use crate::store::CounterStore;
use crate::tiers::{LocalCache, WriteBuffer};
use crate::types::{EngineStats, ReadProvenance, ReadResult, ShardId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Tiered, write-absorbing counter engine.
///
/// Composes the write buffer, the local cache, the shard registry and
/// the flush scheduler behind an `increment`/`read` surface. The tiers
/// are owned exclusively by the engine; only the scheduler drains them.
///
/// Counts are eventually consistent: an increment becomes durable after
/// one buffer→cache cycle and one cache→remote cycle. A process crash
/// before the remote apply loses the unflushed window; that loss is the
/// documented trade-off of the in-memory tiers.
pub struct CounterEngine {
    buffer: Arc<WriteBuffer>,
    cache: Arc<LocalCache>,
    registry: Arc<ShardRegistry>,
    scheduler: Arc<FlushScheduler>,
    metrics: Arc<EngineMetrics>,
    config: EngineConfig,

    started: AtomicBool,
    shutdown_txs: Mutex<Vec<mpsc::Sender<()>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl CounterEngine {
    /// Create an engine from the given configuration. No background
    /// tasks run until [`start`](Self::start) is called.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let buffer = Arc::new(WriteBuffer::new());
        let cache = Arc::new(LocalCache::new(config.cache_max_entries, config.cache_ttl));
        let registry = Arc::new(ShardRegistry::new(config.ring_replicas));
        let metrics = Arc::new(EngineMetrics::new());
        let scheduler = Arc::new(FlushScheduler::new(
            buffer.clone(),
            cache.clone(),
            registry.clone(),
            metrics.clone(),
            &config,
        ));

        Ok(Self {
            buffer,
            cache,
            registry,
            scheduler,
            metrics,
            config,
            started: AtomicBool::new(false),
            shutdown_txs: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Register a shard and its store handle.
    pub fn register_shard(&self, shard_id: impl Into<ShardId>, store: Arc<dyn CounterStore>) {
        self.registry.register(shard_id, store);
    }

    /// Remove a shard. Future writes for its keys route to their ring
    /// successors; accumulated remote data is not migrated.
    pub fn remove_shard(&self, shard_id: &str) -> bool {
        self.registry.remove(shard_id)
    }

    /// Which shard currently owns a key.
    pub fn shard_for(&self, key: &str) -> Result<ShardId> {
        Ok(self.registry.shard_for(key)?)
    }

    /// Record one occurrence of `key`. Fire-and-forget: synchronous,
    /// never blocks on I/O, never fails.
    pub fn increment(&self, key: &str) {
        self.increment_by(key, 1);
    }

    /// Record `delta` occurrences of `key`. Zero deltas are ignored.
    pub fn increment_by(&self, key: &str, delta: u64) {
        if delta == 0 {
            return;
        }
        self.buffer.increment(key, delta);
        self.metrics.increments.inc();
    }

    /// Read the merged count for `key` across all three tiers.
    ///
    /// The remote fetch is bounded by the configured timeout; when it
    /// fails or times out, the in-memory partial sum is returned with
    /// [`ReadProvenance::Degraded`] instead of an error. Routing faults
    /// (empty ring, unregistered shard) are surfaced, since defaulting
    /// them would silently misreport counts.
    pub async fn read(&self, key: &str) -> Result<ReadResult> {
        self.metrics.reads.inc();

        let buffered = self.buffer.get(key);
        let cached = self.cache.get(key).unwrap_or(0);
        let local = buffered + cached;

        let (shard_id, store) = self.registry.resolve(key).map_err(Error::Routing)?;

        let remote = match tokio::time::timeout(self.config.remote_timeout, store.get(key)).await {
            Ok(Ok(remote)) => remote,
            Ok(Err(e)) => {
                warn!(key = %key, shard = %shard_id, error = %e, "remote read failed; serving degraded");
                self.metrics.degraded_reads.inc();
                return Ok(ReadResult {
                    value: local,
                    provenance: ReadProvenance::Degraded,
                    shard: Some(shard_id),
                });
            }
            Err(_) => {
                warn!(key = %key, shard = %shard_id, "remote read timed out; serving degraded");
                self.metrics.degraded_reads.inc();
                return Ok(ReadResult {
                    value: local,
                    provenance: ReadProvenance::Degraded,
                    shard: Some(shard_id),
                });
            }
        };

        let provenance = match remote {
            Some(_) => ReadProvenance::RemoteHit,
            None if cached > 0 => ReadProvenance::CacheHit,
            None => ReadProvenance::BufferOnly,
        };

        Ok(ReadResult {
            value: local + remote.unwrap_or(0),
            provenance,
            shard: Some(shard_id),
        })
    }

    /// Start both flush pipelines. Idempotent; a second call is a no-op.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let (buffer_tx, buffer_rx) = mpsc::channel(1);
        let (remote_tx, remote_rx) = mpsc::channel(1);

        let buffer_task = tokio::spawn(
            self.scheduler
                .clone()
                .run_buffer_loop(self.config.buffer_flush_interval, buffer_rx),
        );
        let remote_task = tokio::spawn(
            self.scheduler
                .clone()
                .run_remote_loop(self.config.cache_flush_interval, remote_rx),
        );

        self.shutdown_txs.lock().extend([buffer_tx, remote_tx]);
        self.tasks.lock().extend([buffer_task, remote_task]);

        info!(
            buffer_interval_ms = self.config.buffer_flush_interval.as_millis() as u64,
            remote_interval_ms = self.config.cache_flush_interval.as_millis() as u64,
            "counter engine started"
        );
    }

    /// Stop the flush pipelines and wait for them to finish their
    /// current cycle. Deltas still in the in-memory tiers are lost.
    pub async fn shutdown(&self) {
        let txs = std::mem::take(&mut *self.shutdown_txs.lock());
        for tx in txs {
            let _ = tx.send(()).await;
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            let _ = task.await;
        }

        self.started.store(false, Ordering::SeqCst);
        info!("counter engine stopped");
    }

    /// Run one buffer→cache cycle followed by one cache→remote cycle.
    ///
    /// For deterministic tests and operational drains; the background
    /// pipelines do the same work on their own schedule.
    pub async fn flush_now(&self) {
        self.scheduler.flush_buffer_to_cache();
        self.scheduler.flush_cache_to_remote().await;
    }

    /// Point-in-time engine state.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            buffer_keys: self.buffer.len(),
            cache_entries: self.cache.len(),
            shard_count: self.registry.shard_count(),
            metrics: self.metrics.snapshot(),
        }
    }
}

impl std::fmt::Debug for CounterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterEngine")
            .field("buffer_keys", &self.buffer.len())
            .field("cache_entries", &self.cache.len())
            .field("shards", &self.registry.shard_count())
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish()
    }
}
