//! 调度门面模块：串联分类、降级、限流、统计、热点识别、策略决策与缓存访问。
//!
//! # Scheduler Facade
//!
//! [`SchedulerFacade::process`] runs one request through the whole pipeline:
//!
//! | Step | Component | Outcome |
//! |------|-----------|---------|
//! | 1 | [`RequestClassifier`](crate::policy::RequestClassifier) | `ctx.request_type` |
//! | 2 | [`DegradeService`](crate::policy::DegradeService) | may stop with [`ProcessOutcome::Degraded`] |
//! | 3 | [`RateLimiterService`](crate::policy::RateLimiterService) | may stop with [`ProcessOutcome::RateLimited`] |
//! | 4 | [`AccessStatisticsService`] | dual-window counts (counted request types only) |
//! | 5 | [`HotspotDetector`] | `ctx.hotspot_level` |
//! | 6 | [`DecisionStrategyEngine`] | dispatch decision (bypass for non-cacheable types) |
//! | 7 | [`CacheAdmissionControl`](crate::policy::CacheAdmissionControl) | `ctx.cache_allowed`; read-only access when rejected |
//! | 8 | [`CacheAccessProxy`] | value from a tier or the loader |
//!
//! Counting and tier failures degrade quietly; the only error `process` can return is
//! a fail-closed statistics failure (`stat.fallbackEnabled: false`).
//!
//! ```rust
//! use hotkey_scheduler::{RequestContext, SchedulerFacade};
//!
//! # tokio_test::block_on(async {
//! let facade = SchedulerFacade::builder().build().unwrap();
//! let mut ctx = RequestContext::new("42").with_biz_type("product");
//! let outcome = facade
//!     .process(&mut ctx, || async { Some("product 42".to_string()) })
//!     .await
//!     .unwrap();
//! assert_eq!(outcome.into_value().as_deref(), Some("product 42"));
//! assert!(ctx.hotspot_level.is_some());
//! # });
//! ```

mod builder;
pub mod prelude;

pub use builder::SchedulerFacadeBuilder;

use crate::cache::{CacheAccessProxy, ProxyStats, WritePolicy};
use crate::config::{ConfigWatcher, SchedulerConfig, WatcherHandle};
use crate::hotspot::HotspotDetector;
use crate::policy::{CacheAdmissionControl, DegradeService, RateLimiterService, RequestClassifier};
use crate::statistics::AccessStatisticsService;
use crate::strategy::DecisionStrategyEngine;
use crate::types::{CacheMode, DispatchDecision, RequestContext, StatResult};
use crate::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of [`SchedulerFacade::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome<T> {
    /// The request went through; `None` when the loader found nothing.
    Served(Option<T>),
    /// Shed by the degrade service; the loader was not called.
    Degraded,
    /// Over the per-key budget; the loader was not called.
    RateLimited,
}

impl<T> ProcessOutcome<T> {
    pub fn is_served(&self) -> bool {
        matches!(self, ProcessOutcome::Served(_))
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            ProcessOutcome::Served(value) => value,
            ProcessOutcome::Degraded | ProcessOutcome::RateLimited => None,
        }
    }
}

pub struct SchedulerFacade {
    statistics: AccessStatisticsService,
    detector: HotspotDetector,
    engine: DecisionStrategyEngine,
    proxy: CacheAccessProxy,
    classifier: Arc<dyn RequestClassifier>,
    degrade: Arc<dyn DegradeService>,
    rate_limiter: Arc<dyn RateLimiterService>,
    admission: Arc<dyn CacheAdmissionControl>,
}

impl SchedulerFacade {
    pub fn builder() -> SchedulerFacadeBuilder {
        SchedulerFacadeBuilder::new()
    }

    /// Run one request through the pipeline. `loader` is called at most once, and only
    /// when no tier can serve the key.
    pub async fn process<T, F, Fut>(
        &self,
        ctx: &mut RequestContext,
        loader: F,
    ) -> Result<ProcessOutcome<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let request_type = self.classifier.classify(ctx);
        ctx.request_type = Some(request_type);

        if self.degrade.should_degrade(ctx) {
            info!(request_id = %ctx.request_id, key = %ctx.cache_key, level = self.degrade.degrade_level(), "request degraded");
            return Ok(ProcessOutcome::Degraded);
        }
        if self.rate_limiter.is_rate_limited(ctx).await {
            info!(request_id = %ctx.request_id, key = %ctx.cache_key, "request rate limited");
            return Ok(ProcessOutcome::RateLimited);
        }

        let stat = if self.classifier.requires_statistics(request_type) {
            self.statistics.record(&ctx.biz_type, &ctx.cache_key).await?
        } else {
            StatResult::empty()
        };
        let level = self.detector.detect(&stat);
        ctx.hotspot_level = Some(level);

        let decision = if self.classifier.is_cacheable(request_type) {
            self.engine.decide(level)
        } else {
            DispatchDecision::bypass()
        };
        let admitted = decision.cache_mode != CacheMode::None
            && self.admission.allow_cache_write(ctx, &stat);
        ctx.cache_allowed = Some(admitted);
        let writes = if admitted {
            WritePolicy::ReadWrite
        } else {
            WritePolicy::ReadOnly
        };

        debug!(
            request_id = %ctx.request_id,
            biz_type = %ctx.biz_type,
            key = %ctx.cache_key,
            count_short = stat.count_short,
            count_long = stat.count_long,
            level = %level,
            decision = %decision,
            cache_allowed = admitted,
            "request scheduled"
        );

        let value = self
            .proxy
            .access_with(&ctx.cache_key, loader, Some(decision), writes)
            .await;
        Ok(ProcessOutcome::Served(value))
    }

    /// Drop a key from both cache tiers, e.g. after the source record changed.
    pub async fn invalidate_cache(&self, cache_key: &str) {
        self.proxy.invalidate(cache_key).await;
    }

    /// Apply a new configuration revision: thresholds and strategy table are swapped
    /// whole. Statistics and tier settings take effect on the next restart.
    pub fn reload(&self, config: &SchedulerConfig) {
        if config.stat != *self.statistics.config() {
            warn!("statistics settings changed; they take effect after restart");
        }
        self.detector.reload(config.hotspot.clone());
        self.engine.rebuild(&config.strategy);
        info!("scheduler configuration reloaded");
    }

    /// Reload from `path` whenever the file changes. Dropping the handle stops watching.
    pub fn watch_config(self: &Arc<Self>, path: impl AsRef<Path>) -> Result<WatcherHandle> {
        let facade = Arc::downgrade(self);
        ConfigWatcher::new().watch(path, move |config| {
            if let Some(facade) = facade.upgrade() {
                facade.reload(&config);
            }
        })
    }

    pub fn statistics(&self) -> &AccessStatisticsService {
        &self.statistics
    }

    pub fn detector(&self) -> &HotspotDetector {
        &self.detector
    }

    pub fn engine(&self) -> &DecisionStrategyEngine {
        &self.engine
    }

    pub fn cache_stats(&self) -> ProxyStats {
        self.proxy.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HotspotConfig, StrategyConfig};
    use crate::policy::DefaultDegradeService;
    use crate::types::{HotspotLevel, RequestType};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn cold_key_is_loaded_and_not_cached() {
        let facade = SchedulerFacade::builder().build().unwrap();
        let mut ctx = RequestContext::new("k");
        let outcome = facade
            .process(&mut ctx, || async { Some(1u32) })
            .await
            .unwrap();
        assert_eq!(outcome, ProcessOutcome::Served(Some(1)));
        assert_eq!(ctx.request_type, Some(RequestType::HighReuseRead));
        assert_eq!(ctx.hotspot_level, Some(HotspotLevel::Cold));
        assert_eq!(ctx.cache_allowed, Some(false));
        assert_eq!(facade.cache_stats().writes, 0);
    }

    #[tokio::test]
    async fn degraded_request_skips_loader() {
        let degrade = Arc::new(DefaultDegradeService::new());
        degrade.set_degrade_level(3);
        let facade = SchedulerFacade::builder()
            .degrade_service(degrade)
            .build()
            .unwrap();
        let mut ctx = RequestContext::new("k");
        let loaded = AtomicBool::new(false);
        let outcome = facade
            .process(&mut ctx, || async {
                loaded.store(true, Ordering::SeqCst);
                Some(1u32)
            })
            .await
            .unwrap();
        assert_eq!(outcome, ProcessOutcome::Degraded);
        assert!(!loaded.load(Ordering::SeqCst));
        assert!(ctx.hotspot_level.is_none());
    }

    #[tokio::test]
    async fn writes_are_not_counted_or_cached() {
        let facade = SchedulerFacade::builder().build().unwrap();
        let mut ctx =
            RequestContext::new("order:1").with_request_type(RequestType::NonCriticalWrite);
        facade
            .process(&mut ctx, || async { Some("ok".to_string()) })
            .await
            .unwrap();
        assert_eq!(facade.statistics().get_access_count("order:1").await, 0);
        assert_eq!(ctx.cache_allowed, Some(false));
    }

    #[tokio::test]
    async fn reload_swaps_thresholds_and_table() {
        let facade = SchedulerFacade::builder().build().unwrap();
        let config = SchedulerConfig::default()
            .with_hotspot(HotspotConfig::default().with_threshold(HotspotLevel::Warm, 1, 60))
            .with_strategy(StrategyConfig::default().with_strategy(
                HotspotLevel::Warm,
                "LOCAL_ONLY",
                "LONG",
            ));
        facade.reload(&config);
        assert_eq!(
            facade.detector().detect(&StatResult::new(1, 1)),
            HotspotLevel::Warm
        );
        assert_eq!(
            facade.engine().decide(HotspotLevel::Warm).cache_mode,
            CacheMode::LocalOnly
        );
    }
}
