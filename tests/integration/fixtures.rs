#![allow(dead_code)]

use async_trait::async_trait;
use hotkey_scheduler::cache::CacheTier;
use hotkey_scheduler::store::{StoreError, StoreResult};
use hotkey_scheduler::TtlLevel;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Wraps a real tier, counts calls and can be forced to fail.
pub struct FlakyTier {
    inner: Arc<dyn CacheTier>,
    failing: AtomicBool,
    pub gets: AtomicU64,
    pub puts: AtomicU64,
    pub invalidations: AtomicU64,
}

impl FlakyTier {
    pub fn wrap(inner: Arc<dyn CacheTier>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            failing: AtomicBool::new(false),
            gets: AtomicU64::new(0),
            puts: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn gets(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::SeqCst)
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!("{} tier down", self.inner.name())))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheTier for FlakyTier {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &[u8], ttl_level: TtlLevel) -> StoreResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.put(key, value, ttl_level).await
    }

    async fn invalidate(&self, key: &str) -> StoreResult<()> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.invalidate(key).await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Loader that counts its invocations.
#[derive(Default)]
pub struct CountingLoader {
    calls: AtomicU64,
}

impl CountingLoader {
    pub async fn load(&self, value: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(value.to_string())
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}
