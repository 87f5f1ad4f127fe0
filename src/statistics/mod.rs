//! 访问统计模块：基于共享计数存储的双窗口访问计数。
//!
//! # Access Statistics
//!
//! Records one access to a key and returns the counts of two concurrently running
//! windows: a short one that catches bursts and a long one that tracks sustained
//! demand. No state is kept in-process, so every scheduler instance sharing the counter
//! store sees the same numbers.
//!
//! ## Key layout
//!
//! `{keyPrefix}:{bizType}:{bizKey}:{window}`, for example `stat:product:42:2s` and
//! `stat:product:42:120s`. `bizType` keeps equal key text of different entity types
//! apart.
//!
//! ## Failure handling
//!
//! Each counter update is bounded by `redisTimeout`. With `fallbackEnabled` (the
//! default) a failed or timed-out update yields [`StatResult::empty`], so the request
//! proceeds as if the key were cold. With it disabled the failure is returned as
//! [`Error::Statistics`].

use crate::config::StatConfig;
use crate::store::{with_timeout, CounterStore, StoreError, StoreResult};
use crate::types::{AccessStatistics, RequestContext, StatResult};
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dual-window access counter.
pub struct AccessStatisticsService {
    store: Arc<dyn CounterStore>,
    config: StatConfig,
    short_label: String,
    long_label: String,
}

impl AccessStatisticsService {
    pub fn new(store: Arc<dyn CounterStore>, config: StatConfig) -> Self {
        let short_label = config.short_window_label();
        let long_label = config.long_window_label();
        info!(
            store = store.name(),
            short_window = %short_label,
            long_window = %long_label,
            key_prefix = %config.key_prefix,
            timeout_ms = config.redis_timeout,
            "access statistics initialized"
        );
        Self {
            store,
            config,
            short_label,
            long_label,
        }
    }

    pub fn config(&self) -> &StatConfig {
        &self.config
    }

    /// Counter key of the short window.
    pub fn short_window_key(&self, biz_type: &str, biz_key: &str) -> String {
        self.counter_key(biz_type, biz_key, &self.short_label)
    }

    /// Counter key of the long window.
    pub fn long_window_key(&self, biz_type: &str, biz_key: &str) -> String {
        self.counter_key(biz_type, biz_key, &self.long_label)
    }

    fn counter_key(&self, biz_type: &str, biz_key: &str, window: &str) -> String {
        format!("{}:{}:{}:{}", self.config.key_prefix, biz_type, biz_key, window)
    }

    /// Record one access and return the updated counts of both windows.
    ///
    /// Empty `biz_type` or `biz_key` yields an empty result rather than an error.
    pub async fn record(&self, biz_type: &str, biz_key: &str) -> Result<StatResult> {
        if biz_type.is_empty() || biz_key.is_empty() {
            warn!(biz_type = %biz_type, biz_key = %biz_key, "invalid statistics input");
            return Ok(StatResult::empty());
        }

        let short_key = self.short_window_key(biz_type, biz_key);
        let long_key = self.long_window_key(biz_type, biz_key);
        let (short, long) = tokio::join!(
            self.incr(&short_key, self.config.short_window()),
            self.incr(&long_key, self.config.long_window()),
        );

        match short.and_then(|s| long.map(|l| StatResult::new(s, l))) {
            Ok(stat) => {
                debug!(
                    biz_type = %biz_type,
                    biz_key = %biz_key,
                    count_short = stat.count_short,
                    count_long = stat.count_long,
                    "access recorded"
                );
                Ok(stat)
            }
            Err(e) if self.config.fallback_enabled => {
                warn!(biz_type = %biz_type, biz_key = %biz_key, error = %e, "access statistics degraded to empty result");
                Ok(StatResult::empty())
            }
            Err(e) => Err(Error::statistics(
                "counter store failed and fallback is disabled",
                ErrorContext::new()
                    .with_field_path(long_key)
                    .with_source("statistics"),
                e,
            )),
        }
    }

    /// Compat shim for single-key callers: records under the `default` biz type.
    pub async fn record_access(&self, cache_key: &str) {
        if cache_key.is_empty() {
            warn!("invalid cache key for record_access");
            return;
        }
        if let Err(e) = self
            .record(RequestContext::DEFAULT_BIZ_TYPE, cache_key)
            .await
        {
            warn!(key = %cache_key, error = %e, "record_access failed");
        }
    }

    /// Long-window count of `cache_key` under the `default` biz type, without
    /// incrementing. Returns 0 on empty input or any failure.
    pub async fn get_access_count(&self, cache_key: &str) -> u64 {
        if cache_key.is_empty() {
            warn!("invalid cache key for get_access_count");
            return 0;
        }
        let key = self.long_window_key(RequestContext::DEFAULT_BIZ_TYPE, cache_key);
        let mut attempt = 0u32;
        loop {
            match self.read(&key).await {
                Ok(count) => return count.unwrap_or(0),
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    debug!(key = %key, attempt, error = %e, "retrying counter read");
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "failed to read access count");
                    return 0;
                }
            }
        }
    }

    /// Long-window snapshot for legacy consumers.
    pub async fn get_statistics(&self, cache_key: &str) -> AccessStatistics {
        let window = self.config.long_window();
        if cache_key.is_empty() {
            return AccessStatistics::empty(cache_key, window);
        }
        let count = self.get_access_count(cache_key).await;
        AccessStatistics::new(cache_key, count, window)
    }

    /// Remove both window counters of a key.
    pub async fn reset(&self, biz_type: &str, biz_key: &str) -> Result<()> {
        let limit = self.config.timeout();
        for key in [
            self.short_window_key(biz_type, biz_key),
            self.long_window_key(biz_type, biz_key),
        ] {
            with_timeout("counter delete", limit, self.store.delete_counter(&key)).await?;
        }
        Ok(())
    }

    async fn incr(&self, key: &str, window: std::time::Duration) -> StoreResult<u64> {
        with_timeout(
            "counter increment",
            self.config.timeout(),
            self.store.incr_with_expire(key, window),
        )
        .await
    }

    async fn read(&self, key: &str) -> std::result::Result<Option<u64>, StoreError> {
        with_timeout("counter read", self.config.timeout(), self.store.get_count(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCounterStore;
    use std::time::Duration;

    fn service(store: Arc<MemoryCounterStore>, config: StatConfig) -> AccessStatisticsService {
        AccessStatisticsService::new(store, config)
    }

    #[test]
    fn builds_wire_compatible_keys() {
        let svc = service(Arc::new(MemoryCounterStore::new()), StatConfig::default());
        assert_eq!(svc.short_window_key("product", "42"), "stat:product:42:2s");
        assert_eq!(svc.long_window_key("product", "42"), "stat:product:42:120s");

        let flash = service(
            Arc::new(MemoryCounterStore::new()),
            StatConfig::default()
                .with_short_window_seconds(0.5)
                .with_key_prefix("stat_test"),
        );
        assert_eq!(flash.short_window_key("sku", "9"), "stat_test:sku:9:0.5s");
    }

    #[tokio::test]
    async fn counts_accumulate_in_both_windows() {
        let svc = service(Arc::new(MemoryCounterStore::new()), StatConfig::default());
        let mut last = StatResult::empty();
        for _ in 0..5 {
            last = svc.record("test", "multiple").await.unwrap();
        }
        assert_eq!(last, StatResult::new(5, 5));
    }

    #[tokio::test]
    async fn biz_types_are_isolated() {
        let svc = service(Arc::new(MemoryCounterStore::new()), StatConfig::default());
        let product = svc.record("product", "7").await.unwrap();
        let order = svc.record("order", "7").await.unwrap();
        assert_eq!(product.count_short, 1);
        assert_eq!(order.count_short, 1);
    }

    #[tokio::test]
    async fn empty_input_yields_empty_result() {
        let store = Arc::new(MemoryCounterStore::new());
        let svc = service(store.clone(), StatConfig::default());
        assert_eq!(svc.record("", "key").await.unwrap(), StatResult::empty());
        assert_eq!(svc.record("type", "").await.unwrap(), StatResult::empty());
        assert_eq!(store.get_count("stat::key:2s").await.unwrap(), None);
    }

    #[tokio::test]
    async fn outage_falls_back_to_empty_by_default() {
        let store = Arc::new(MemoryCounterStore::new());
        store.set_available(false);
        let svc = service(store, StatConfig::default());
        assert_eq!(svc.record("test", "down").await.unwrap(), StatResult::empty());
    }

    #[tokio::test]
    async fn outage_propagates_when_fail_closed() {
        let store = Arc::new(MemoryCounterStore::new());
        store.set_available(false);
        let svc = service(store, StatConfig::default().with_fallback_enabled(false));
        let err = svc.record("test", "down").await.unwrap_err();
        assert!(matches!(err, Error::Statistics { cause: Some(_), .. }));
    }

    #[tokio::test]
    async fn slow_store_times_out_into_fallback() {
        let store = Arc::new(MemoryCounterStore::new());
        store.set_latency(Duration::from_millis(200));
        let svc = service(store, StatConfig::default().with_redis_timeout(20));
        assert_eq!(svc.record("test", "slow").await.unwrap(), StatResult::empty());
    }

    #[tokio::test]
    async fn access_count_reads_long_window_without_incrementing() {
        let svc = service(Arc::new(MemoryCounterStore::new()), StatConfig::default());
        assert_eq!(svc.get_access_count("sku:1").await, 0);
        svc.record_access("sku:1").await;
        svc.record_access("sku:1").await;
        assert_eq!(svc.get_access_count("sku:1").await, 2);
        assert_eq!(svc.get_access_count("sku:1").await, 2);
        assert_eq!(svc.get_access_count("").await, 0);

        let stats = svc.get_statistics("sku:1").await;
        assert_eq!(stats.access_count, 2);
        assert_eq!(stats.window_size, Duration::from_secs(120));
    }

    #[tokio::test]
    async fn access_count_is_zero_when_store_is_down() {
        let store = Arc::new(MemoryCounterStore::new());
        let svc = service(store.clone(), StatConfig::default().with_max_retries(1));
        svc.record_access("sku:2").await;
        store.set_available(false);
        assert_eq!(svc.get_access_count("sku:2").await, 0);
    }

    #[tokio::test]
    async fn reset_clears_both_windows() {
        let svc = service(Arc::new(MemoryCounterStore::new()), StatConfig::default());
        svc.record("test", "r").await.unwrap();
        svc.reset("test", "r").await.unwrap();
        assert_eq!(svc.record("test", "r").await.unwrap(), StatResult::new(1, 1));
    }
}
