//! Read-through access over the local and remote tiers.

use super::tier::{CacheTier, TierRead};
use crate::types::{CacheMode, DispatchDecision, TtlLevel};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Whether a miss may populate the tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    #[default]
    ReadWrite,
    /// Tiers are read but never written, backfill included.
    ReadOnly,
}

impl WritePolicy {
    pub fn allows_writes(self) -> bool {
        matches!(self, WritePolicy::ReadWrite)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyStats {
    pub local_hits: u64,
    pub remote_hits: u64,
    /// Tier reads that found nothing.
    pub misses: u64,
    /// Loader invocations.
    pub loads: u64,
    pub writes: u64,
    /// Tier failures and undecodable values, all treated as misses or no-ops.
    pub errors: u64,
}

impl ProxyStats {
    pub fn hits(&self) -> u64 {
        self.local_hits + self.remote_hits
    }

    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits() + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    local_hits: AtomicU64,
    remote_hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    writes: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn to_stats(&self) -> ProxyStats {
        ProxyStats {
            local_hits: self.local_hits.load(Ordering::Relaxed),
            remote_hits: self.remote_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Executes a [`DispatchDecision`] against the tiers.
///
/// Values cross the tier boundary as JSON, so both tiers hold identical bytes and a
/// remote hit can be backfilled into the local tier without re-encoding. No tier
/// failure ever reaches the caller: a failed read is a miss, a failed write is skipped.
pub struct CacheAccessProxy {
    local: Arc<dyn CacheTier>,
    remote: Arc<dyn CacheTier>,
    stats: AtomicStats,
}

impl CacheAccessProxy {
    pub fn new(local: Arc<dyn CacheTier>, remote: Arc<dyn CacheTier>) -> Self {
        Self {
            local,
            remote,
            stats: AtomicStats::default(),
        }
    }

    pub fn stats(&self) -> ProxyStats {
        self.stats.to_stats()
    }

    /// Serve `key` according to `decision`, calling `loader` at most once.
    ///
    /// An empty key or a missing decision bypasses both tiers.
    pub async fn access<T, F, Fut>(
        &self,
        key: &str,
        loader: F,
        decision: Option<DispatchDecision>,
    ) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        self.access_with(key, loader, decision, WritePolicy::ReadWrite)
            .await
    }

    pub async fn access_with<T, F, Fut>(
        &self,
        key: &str,
        loader: F,
        decision: Option<DispatchDecision>,
        writes: WritePolicy,
    ) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let decision = match decision {
            Some(d) if !key.is_empty() => d,
            _ => {
                warn!(key = %key, has_decision = decision.is_some(), "invalid cache access, loading directly");
                return self.load(loader).await;
            }
        };
        debug!(key = %key, decision = %decision, writes = ?writes, "cache access");

        match decision.cache_mode {
            CacheMode::None => self.load(loader).await,
            CacheMode::LocalOnly => {
                self.single_tier(
                    &*self.local,
                    &self.stats.local_hits,
                    key,
                    loader,
                    decision.ttl_level,
                    writes,
                )
                .await
            }
            CacheMode::RemoteOnly => {
                self.single_tier(
                    &*self.remote,
                    &self.stats.remote_hits,
                    key,
                    loader,
                    decision.ttl_level,
                    writes,
                )
                .await
            }
            CacheMode::LocalAndRemote => {
                self.both_tiers(key, loader, decision.ttl_level, writes).await
            }
        }
    }

    /// Remove `key` from both tiers. Each tier is attempted regardless of the other.
    pub async fn invalidate(&self, key: &str) {
        if key.is_empty() {
            debug!("empty key, nothing to invalidate");
            return;
        }
        let (local, remote) = tokio::join!(self.local.invalidate(key), self.remote.invalidate(key));
        for (tier, result) in [(self.local.name(), local), (self.remote.name(), remote)] {
            if let Err(e) = result {
                AtomicStats::bump(&self.stats.errors);
                warn!(key = %key, tier, error = %e, "cache invalidation failed");
            }
        }
    }

    async fn single_tier<T, F, Fut>(
        &self,
        tier: &dyn CacheTier,
        hits: &AtomicU64,
        key: &str,
        loader: F,
        ttl_level: TtlLevel,
        writes: WritePolicy,
    ) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        if let Some((value, _)) = self.read(tier, hits, key).await {
            return Some(value);
        }
        let value = self.load(loader).await?;
        if writes.allows_writes() {
            if let Some(bytes) = encode(key, &value) {
                self.write(tier, key, &bytes, ttl_level).await;
            }
        }
        Some(value)
    }

    async fn both_tiers<T, F, Fut>(
        &self,
        key: &str,
        loader: F,
        ttl_level: TtlLevel,
        writes: WritePolicy,
    ) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        if let Some((value, _)) = self.read(&*self.local, &self.stats.local_hits, key).await {
            return Some(value);
        }
        if let Some((value, bytes)) = self.read(&*self.remote, &self.stats.remote_hits, key).await {
            if writes.allows_writes() {
                self.write(&*self.local, key, &bytes, ttl_level).await;
            }
            return Some(value);
        }
        let value = self.load(loader).await?;
        if writes.allows_writes() {
            if let Some(bytes) = encode(key, &value) {
                self.write(&*self.remote, key, &bytes, ttl_level).await;
                self.write(&*self.local, key, &bytes, ttl_level).await;
            }
        }
        Some(value)
    }

    /// Decoded value and its raw bytes, or `None` on miss, failure or bad payload.
    async fn read<T: DeserializeOwned>(
        &self,
        tier: &dyn CacheTier,
        hits: &AtomicU64,
        key: &str,
    ) -> Option<(T, Vec<u8>)> {
        match TierRead::from(tier.get(key).await) {
            TierRead::Hit(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    AtomicStats::bump(hits);
                    debug!(key = %key, tier = tier.name(), "cache hit");
                    Some((value, bytes))
                }
                Err(e) => {
                    AtomicStats::bump(&self.stats.errors);
                    warn!(key = %key, tier = tier.name(), error = %e, "undecodable cache entry, treating as miss");
                    None
                }
            },
            TierRead::Miss => {
                AtomicStats::bump(&self.stats.misses);
                debug!(key = %key, tier = tier.name(), "cache miss");
                None
            }
            TierRead::Failed(e) => {
                AtomicStats::bump(&self.stats.errors);
                warn!(key = %key, tier = tier.name(), error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn write(&self, tier: &dyn CacheTier, key: &str, bytes: &[u8], ttl_level: TtlLevel) {
        match tier.put(key, bytes, ttl_level).await {
            Ok(()) => {
                AtomicStats::bump(&self.stats.writes);
                debug!(key = %key, tier = tier.name(), ttl_level = %ttl_level, "cache populated");
            }
            Err(e) => {
                AtomicStats::bump(&self.stats.errors);
                warn!(key = %key, tier = tier.name(), error = %e, "cache write failed");
            }
        }
    }

    async fn load<T, F, Fut>(&self, loader: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        AtomicStats::bump(&self.stats.loads);
        loader().await
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Option<Vec<u8>> {
    match serde_json::to_vec(value) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(key = %key, error = %e, "value not serializable, skipping cache write");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalCacheClient;
    use crate::config::{CacheConfig, TtlTable};
    use crate::store::{StoreError, StoreResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;

    /// Tier that records every call and can be switched into failure.
    #[derive(Default)]
    struct RecordingTier {
        name: &'static str,
        entries: Mutex<HashMap<String, Vec<u8>>>,
        failing: AtomicBool,
        gets: AtomicU64,
        puts: AtomicU64,
        invalidations: AtomicU64,
    }

    impl RecordingTier {
        fn named(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                ..Default::default()
            })
        }

        fn seed(&self, key: &str, json: &str) {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), json.as_bytes().to_vec());
        }

        fn fail(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }

        fn check(&self) -> StoreResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                Err(StoreError::Unavailable(format!("{} down", self.name)))
            } else {
                Ok(())
            }
        }

        fn count(counter: &AtomicU64) -> u64 {
            counter.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CacheTier for RecordingTier {
        async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn put(&self, key: &str, value: &[u8], _: TtlLevel) -> StoreResult<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn invalidate(&self, key: &str) -> StoreResult<()> {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    fn setup() -> (Arc<RecordingTier>, Arc<RecordingTier>, CacheAccessProxy) {
        let local = RecordingTier::named("local");
        let remote = RecordingTier::named("remote");
        let proxy = CacheAccessProxy::new(local.clone(), remote.clone());
        (local, remote, proxy)
    }

    fn decision(mode: CacheMode) -> Option<DispatchDecision> {
        Some(DispatchDecision::new(mode, TtlLevel::Normal))
    }

    #[tokio::test]
    async fn none_mode_never_touches_tiers() {
        let (local, remote, proxy) = setup();
        let loads = AtomicU64::new(0);
        let value = proxy
            .access(
                "k",
                || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Some(1u32)
                },
                decision(CacheMode::None),
            )
            .await;
        assert_eq!(value, Some(1));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        for tier in [&local, &remote] {
            assert_eq!(RecordingTier::count(&tier.gets), 0);
            assert_eq!(RecordingTier::count(&tier.puts), 0);
        }
    }

    #[tokio::test]
    async fn invalid_input_goes_straight_to_loader() {
        let (local, remote, proxy) = setup();
        assert_eq!(
            proxy
                .access("", || async { Some("x".to_string()) }, decision(CacheMode::LocalAndRemote))
                .await,
            Some("x".to_string())
        );
        assert_eq!(
            proxy.access("k", || async { Some(2u8) }, None).await,
            Some(2)
        );
        assert_eq!(RecordingTier::count(&local.gets), 0);
        assert_eq!(RecordingTier::count(&remote.gets), 0);
        assert_eq!(proxy.stats().loads, 2);
    }

    #[tokio::test]
    async fn remote_hit_backfills_local_without_loading() {
        let (local, remote, proxy) = setup();
        remote.seed("k", "42");
        let loads = AtomicU64::new(0);
        let value: Option<u32> = proxy
            .access(
                "k",
                || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    None
                },
                decision(CacheMode::LocalAndRemote),
            )
            .await;
        assert_eq!(value, Some(42));
        assert_eq!(loads.load(Ordering::SeqCst), 0);
        assert_eq!(RecordingTier::count(&local.puts), 1);
        assert_eq!(RecordingTier::count(&remote.puts), 0);
        assert_eq!(local.entries.lock().unwrap().get("k"), Some(&b"42".to_vec()));
        assert_eq!(proxy.stats().remote_hits, 1);
    }

    #[tokio::test]
    async fn double_miss_loads_once_and_writes_both_tiers() {
        let (local, remote, proxy) = setup();
        let loads = AtomicU64::new(0);
        let value = proxy
            .access(
                "k",
                || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Some(vec![1, 2, 3])
                },
                decision(CacheMode::LocalAndRemote),
            )
            .await;
        assert_eq!(value, Some(vec![1, 2, 3]));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(RecordingTier::count(&local.puts), 1);
        assert_eq!(RecordingTier::count(&remote.puts), 1);

        // Second access is a local hit.
        let again: Option<Vec<i32>> = proxy
            .access("k", || async { None }, decision(CacheMode::LocalAndRemote))
            .await;
        assert_eq!(again, Some(vec![1, 2, 3]));
        assert_eq!(RecordingTier::count(&remote.gets), 1);
        assert_eq!(proxy.stats().local_hits, 1);
    }

    #[tokio::test]
    async fn local_failure_falls_through_to_remote() {
        let (local, remote, proxy) = setup();
        local.fail();
        remote.seed("k", "\"cached\"");
        let value: Option<String> = proxy
            .access("k", || async { None }, decision(CacheMode::LocalAndRemote))
            .await;
        assert_eq!(value.as_deref(), Some("cached"));
        // Backfill was attempted and failed quietly.
        assert_eq!(RecordingTier::count(&local.puts), 1);
        assert_eq!(proxy.stats().errors, 2);
    }

    #[tokio::test]
    async fn failing_tiers_never_fail_the_request() {
        let (local, remote, proxy) = setup();
        local.fail();
        remote.fail();
        let value = proxy
            .access("k", || async { Some(7u64) }, decision(CacheMode::LocalAndRemote))
            .await;
        assert_eq!(value, Some(7));
        assert_eq!(proxy.stats().loads, 1);
    }

    #[tokio::test]
    async fn single_tier_modes_use_only_their_tier() {
        let (local, remote, proxy) = setup();
        proxy
            .access("a", || async { Some(1u8) }, decision(CacheMode::LocalOnly))
            .await;
        proxy
            .access("b", || async { Some(2u8) }, decision(CacheMode::RemoteOnly))
            .await;
        assert_eq!(RecordingTier::count(&local.puts), 1);
        assert_eq!(RecordingTier::count(&remote.puts), 1);
        assert!(local.entries.lock().unwrap().contains_key("a"));
        assert!(remote.entries.lock().unwrap().contains_key("b"));
    }

    #[tokio::test]
    async fn absent_value_is_not_cached() {
        let (local, remote, proxy) = setup();
        let value: Option<u8> = proxy
            .access("k", || async { None }, decision(CacheMode::LocalAndRemote))
            .await;
        assert_eq!(value, None);
        assert_eq!(RecordingTier::count(&local.puts), 0);
        assert_eq!(RecordingTier::count(&remote.puts), 0);
    }

    #[tokio::test]
    async fn read_only_policy_skips_all_writes() {
        let (local, remote, proxy) = setup();
        remote.seed("hit", "1");
        let hit: Option<u8> = proxy
            .access_with(
                "hit",
                || async { None },
                decision(CacheMode::LocalAndRemote),
                WritePolicy::ReadOnly,
            )
            .await;
        assert_eq!(hit, Some(1));
        let loaded = proxy
            .access_with(
                "miss",
                || async { Some(2u8) },
                decision(CacheMode::LocalAndRemote),
                WritePolicy::ReadOnly,
            )
            .await;
        assert_eq!(loaded, Some(2));
        assert_eq!(RecordingTier::count(&local.puts), 0);
        assert_eq!(RecordingTier::count(&remote.puts), 0);
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let (_local, remote, proxy) = setup();
        remote.seed("k", "not json");
        let value = proxy
            .access("k", || async { Some(5u8) }, decision(CacheMode::RemoteOnly))
            .await;
        assert_eq!(value, Some(5));
        assert_eq!(remote.entries.lock().unwrap().get("k"), Some(&b"5".to_vec()));
    }

    #[tokio::test]
    async fn invalidate_reaches_both_tiers_despite_failure() {
        let (local, remote, proxy) = setup();
        local.fail();
        remote.seed("k", "1");
        proxy.invalidate("k").await;
        assert_eq!(RecordingTier::count(&local.invalidations), 1);
        assert_eq!(RecordingTier::count(&remote.invalidations), 1);
        assert!(remote.entries.lock().unwrap().is_empty());

        proxy.invalidate("").await;
        assert_eq!(RecordingTier::count(&local.invalidations), 1);
        assert_eq!(RecordingTier::count(&remote.invalidations), 1);
    }

    #[tokio::test]
    async fn works_with_the_real_local_tier() {
        let local = Arc::new(LocalCacheClient::from_config(&CacheConfig::default()));
        let remote = RecordingTier::named("remote");
        let proxy = CacheAccessProxy::new(local.clone(), remote);
        proxy
            .access("k", || async { Some("v".to_string()) }, decision(CacheMode::LocalOnly))
            .await;
        assert_eq!(local.get("k").await.unwrap(), Some(b"\"v\"".to_vec()));
    }

    #[tokio::test]
    async fn unbounded_local_ttl_still_serves_the_value() {
        let ttl = TtlTable::new(u64::MAX, u64::MAX, u64::MAX);
        let local = Arc::new(LocalCacheClient::new(16, ttl));
        let remote = RecordingTier::named("remote");
        let proxy = CacheAccessProxy::new(local.clone(), remote.clone());
        let first = proxy
            .access("k", || async { Some(7u8) }, decision(CacheMode::LocalAndRemote))
            .await;
        assert_eq!(first, Some(7));
        let second: Option<u8> = proxy
            .access("k", || async { None }, decision(CacheMode::LocalAndRemote))
            .await;
        assert_eq!(second, Some(7));
        assert_eq!(RecordingTier::count(&remote.gets), 1);
    }
}
