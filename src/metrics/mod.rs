//! Engine metrics.
//!
//! Lightweight Prometheus-style atomics. Flush failures are absorbed by
//! the pipelines rather than raised to callers, so these counters (plus
//! the logs) are the only way persistent trouble surfaces.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter.
#[derive(Debug)]
pub struct Counter {
    name: &'static str,
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            value: AtomicU64::new(0),
        }
    }

    /// Get the counter name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Increment the counter by 1.
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the counter by a specific amount.
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Get the current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// All counters kept by the engine.
#[derive(Debug)]
pub struct EngineMetrics {
    /// Increments accepted into the write buffer.
    pub increments: Counter,
    /// Reads served, any provenance.
    pub reads: Counter,
    /// Reads answered from in-memory state because the remote tier was
    /// unreachable.
    pub degraded_reads: Counter,
    /// Completed buffer-to-cache flush cycles.
    pub buffer_flushes: Counter,
    /// Completed cache-to-remote flush cycles.
    pub remote_flushes: Counter,
    /// Successful remote increment applications.
    pub remote_increments: Counter,
    /// Remote increments that failed or timed out and were requeued.
    pub remote_failures: Counter,
}

impl EngineMetrics {
    /// Create a zeroed metrics set.
    pub const fn new() -> Self {
        Self {
            increments: Counter::new("tallyring_increments_total"),
            reads: Counter::new("tallyring_reads_total"),
            degraded_reads: Counter::new("tallyring_degraded_reads_total"),
            buffer_flushes: Counter::new("tallyring_buffer_flushes_total"),
            remote_flushes: Counter::new("tallyring_remote_flushes_total"),
            remote_increments: Counter::new("tallyring_remote_increments_total"),
            remote_failures: Counter::new("tallyring_remote_failures_total"),
        }
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            increments: self.increments.get(),
            reads: self.reads.get(),
            degraded_reads: self.degraded_reads.get(),
            buffer_flushes: self.buffer_flushes.get(),
            remote_flushes: self.remote_flushes.get(),
            remote_increments: self.remote_increments.get(),
            remote_failures: self.remote_failures.get(),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time values of all engine counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub increments: u64,
    pub reads: u64,
    pub degraded_reads: u64,
    pub buffer_flushes: u64,
    pub remote_flushes: u64,
    pub remote_increments: u64,
    pub remote_failures: u64,
}
