//! Shared test doubles and helpers.

use crate::error::StoreError;
use crate::store::{CounterStore, MemoryStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A [`CounterStore`] that fails a configurable number of increments
/// before behaving like a [`MemoryStore`].
#[derive(Debug)]
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    increment_failures_left: AtomicU64,
    fail_gets: bool,
}

impl FlakyStore {
    /// Fail the first `n` increment calls, then succeed. Reads always
    /// succeed.
    pub(crate) fn failing_times(n: u64) -> Self {
        Self {
            inner: MemoryStore::new(),
            increment_failures_left: AtomicU64::new(n),
            fail_gets: false,
        }
    }

    /// Fail every call, reads included.
    pub(crate) fn always_failing() -> Self {
        Self {
            inner: MemoryStore::new(),
            increment_failures_left: AtomicU64::new(u64::MAX),
            fail_gets: true,
        }
    }

    /// Synchronous view of the accumulated value.
    pub(crate) fn value(&self, key: &str) -> Option<u64> {
        self.inner.value(key)
    }

    fn should_fail_increment(&self) -> bool {
        self.increment_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl CounterStore for FlakyStore {
    async fn increment(&self, key: &str, delta: u64) -> Result<(), StoreError> {
        if self.should_fail_increment() {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        self.inner.increment(key, delta).await
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        if self.fail_gets {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        self.inner.get(key).await
    }
}

/// Install a compact subscriber so `RUST_LOG=debug cargo test` shows
/// engine logs. Safe to call from every test.
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Poll `check` until it returns true or `timeout` elapses.
pub(crate) async fn wait_until<F>(mut check: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
