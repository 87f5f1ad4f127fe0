use super::SchedulerFacade;
use crate::cache::{CacheAccessProxy, CacheTier, LocalCacheClient, RemoteCacheClient};
use crate::config::SchedulerConfig;
use crate::hotspot::HotspotDetector;
use crate::policy::{
    CacheAdmissionControl, CounterRateLimiter, DefaultCacheAdmissionControl,
    DefaultDegradeService, DefaultRequestClassifier, DegradeService, RateLimiterService,
    RequestClassifier,
};
use crate::statistics::AccessStatisticsService;
use crate::store::{
    CounterStore, KeyValueStore, MemoryCounterStore, MemoryKeyValueStore, RedisCounterStore,
    RedisKeyValueStore,
};
use crate::strategy::DecisionStrategyEngine;
use crate::Result;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use tracing::{info, warn};

/// Builder for [`SchedulerFacade`].
///
/// Anything not supplied falls back to a default: in-memory stores, the LRU local tier,
/// and the default policy hooks configured from [`SchedulerConfig::policy`].
pub struct SchedulerFacadeBuilder {
    config: SchedulerConfig,
    counter_store: Option<Arc<dyn CounterStore>>,
    remote_store: Option<Arc<dyn KeyValueStore>>,
    local_tier: Option<Arc<dyn CacheTier>>,
    remote_tier: Option<Arc<dyn CacheTier>>,
    classifier: Option<Arc<dyn RequestClassifier>>,
    degrade: Option<Arc<dyn DegradeService>>,
    rate_limiter: Option<Arc<dyn RateLimiterService>>,
    admission: Option<Arc<dyn CacheAdmissionControl>>,
}

impl SchedulerFacadeBuilder {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            counter_store: None,
            remote_store: None,
            local_tier: None,
            remote_tier: None,
            classifier: None,
            degrade: None,
            rate_limiter: None,
            admission: None,
        }
    }

    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use one Redis deployment for both the counters and the remote tier.
    pub fn redis(self, conn: ConnectionManager) -> Self {
        self.counter_store(Arc::new(RedisCounterStore::new(conn.clone())))
            .remote_store(Arc::new(RedisKeyValueStore::new(conn)))
    }

    pub fn counter_store(mut self, store: Arc<dyn CounterStore>) -> Self {
        self.counter_store = Some(store);
        self
    }

    /// Store behind the default remote tier. Ignored when [`Self::remote_tier`] is set.
    pub fn remote_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.remote_store = Some(store);
        self
    }

    pub fn local_tier(mut self, tier: Arc<dyn CacheTier>) -> Self {
        self.local_tier = Some(tier);
        self
    }

    pub fn remote_tier(mut self, tier: Arc<dyn CacheTier>) -> Self {
        self.remote_tier = Some(tier);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn RequestClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn degrade_service(mut self, degrade: Arc<dyn DegradeService>) -> Self {
        self.degrade = Some(degrade);
        self
    }

    pub fn rate_limiter(mut self, limiter: Arc<dyn RateLimiterService>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn admission_control(mut self, admission: Arc<dyn CacheAdmissionControl>) -> Self {
        self.admission = Some(admission);
        self
    }

    /// Validate the configuration and assemble the pipeline.
    pub fn build(self) -> Result<SchedulerFacade> {
        let config = self.config;
        config.validate()?;

        let counter_store = self.counter_store.unwrap_or_else(|| {
            warn!("no counter store configured, access counts are local to this process");
            Arc::new(MemoryCounterStore::new())
        });

        let local_tier = self
            .local_tier
            .unwrap_or_else(|| Arc::new(LocalCacheClient::from_config(&config.cache)));
        let remote_tier: Arc<dyn CacheTier> = match self.remote_tier {
            Some(tier) => tier,
            None => {
                let store = self.remote_store.unwrap_or_else(|| {
                    warn!("no remote store configured, remote tier is local to this process");
                    Arc::new(MemoryKeyValueStore::new())
                });
                Arc::new(RemoteCacheClient::from_config(store, &config.cache))
            }
        };

        let rate_limiter = self.rate_limiter.unwrap_or_else(|| {
            Arc::new(
                CounterRateLimiter::new(
                    counter_store.clone(),
                    config.policy.rate_limit_permits_per_second,
                )
                .with_timeout(config.stat.timeout()),
            )
        });
        let admission = self.admission.unwrap_or_else(|| {
            Arc::new(DefaultCacheAdmissionControl::new(
                config.policy.min_access_threshold,
            ))
        });

        info!(
            counter_store = counter_store.name(),
            local_tier = local_tier.name(),
            remote_tier = remote_tier.name(),
            "scheduler facade built"
        );

        Ok(SchedulerFacade {
            statistics: AccessStatisticsService::new(counter_store, config.stat.clone()),
            detector: HotspotDetector::new(config.hotspot.clone()),
            engine: DecisionStrategyEngine::new(&config.strategy),
            proxy: CacheAccessProxy::new(local_tier, remote_tier),
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(DefaultRequestClassifier)),
            degrade: self
                .degrade
                .unwrap_or_else(|| Arc::new(DefaultDegradeService::new())),
            rate_limiter,
            admission,
        })
    }
}

impl Default for SchedulerFacadeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
