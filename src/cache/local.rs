//! In-process cache tier.

use super::tier::CacheTier;
use crate::config::{CacheConfig, TtlTable};
use crate::store::{StoreError, StoreResult};
use crate::types::TtlLevel;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Instant;

struct LocalEntry {
    data: Vec<u8>,
    /// `None` when the ttl reaches past what `Instant` can hold.
    expires_at: Option<Instant>,
}

impl LocalEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Bounded LRU with per-entry expiry. Each process has its own copy, so entries are
/// only as fresh as their (short) local ttl.
pub struct LocalCacheClient {
    entries: Mutex<LruCache<String, LocalEntry>>,
    ttl: TtlTable,
}

impl LocalCacheClient {
    pub fn new(max_entries: usize, ttl: TtlTable) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.local_max_entries, config.local)
    }

    pub fn ttl_table(&self) -> TtlTable {
        self.ttl
    }

    /// Entries currently held, expired ones included until they are touched or evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, LruCache<String, LocalEntry>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("local cache lock poisoned".into()))
    }
}

#[async_trait]
impl CacheTier for LocalCacheClient {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.data.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: &[u8], ttl_level: TtlLevel) -> StoreResult<()> {
        let entry = LocalEntry {
            data: value.to_vec(),
            expires_at: Instant::now().checked_add(self.ttl.duration(ttl_level)),
        };
        self.lock()?.put(key.to_string(), entry);
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> StoreResult<()> {
        self.lock()?.pop(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_invalidate() {
        let local = LocalCacheClient::from_config(&CacheConfig::default());
        local.put("k", b"v", TtlLevel::Normal).await.unwrap();
        assert_eq!(local.get("k").await.unwrap(), Some(b"v".to_vec()));
        local.invalidate("k").await.unwrap();
        assert_eq!(local.get("k").await.unwrap(), None);
        // Invalidating an absent key is fine.
        local.invalidate("k").await.unwrap();
    }

    #[tokio::test]
    async fn evicts_least_recently_used_beyond_capacity() {
        let local = LocalCacheClient::new(2, TtlTable::new(10, 30, 60));
        local.put("a", b"1", TtlLevel::Short).await.unwrap();
        local.put("b", b"2", TtlLevel::Short).await.unwrap();
        local.get("a").await.unwrap();
        local.put("c", b"3", TtlLevel::Short).await.unwrap();
        assert_eq!(local.len(), 2);
        assert!(local.get("b").await.unwrap().is_none());
        assert!(local.get("a").await.unwrap().is_some());
        assert!(local.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unbounded_ttl_is_kept_instead_of_overflowing() {
        let local = LocalCacheClient::new(10, TtlTable::new(1, u64::MAX, u64::MAX));
        local.put("k", b"v", TtlLevel::Long).await.unwrap();
        assert_eq!(local.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn entries_expire_by_ttl_level() {
        let local = LocalCacheClient::new(10, TtlTable::new(1, 30, 60));
        local.put("short", b"s", TtlLevel::Short).await.unwrap();
        local.put("long", b"l", TtlLevel::Long).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        assert_eq!(local.get("short").await.unwrap(), None);
        assert_eq!(local.get("long").await.unwrap(), Some(b"l".to_vec()));
    }
}
