use crate::store::{with_timeout, CounterStore};
use crate::types::RequestContext;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const RATE_LIMIT_PREFIX: &str = "rate_limit";
const WINDOW: Duration = Duration::from_secs(1);

#[async_trait]
pub trait RateLimiterService: Send + Sync {
    async fn is_rate_limited(&self, ctx: &RequestContext) -> bool;

    /// Take one permit for `key` under a per-second budget.
    async fn try_acquire(&self, key: &str, permits_per_second: u64) -> bool;

    /// Permits taken for `key` in the current second.
    async fn current_qps(&self, key: &str) -> u64;
}

/// Fixed one-second window over the shared counter store, so the budget is global
/// across instances. Fails open: a store error admits the request.
pub struct CounterRateLimiter {
    store: Arc<dyn CounterStore>,
    permits_per_second: Option<u64>,
    timeout: Duration,
}

impl CounterRateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, permits_per_second: Option<u64>) -> Self {
        Self {
            store,
            permits_per_second,
            timeout: Duration::from_millis(3000),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn counter_key(key: &str) -> String {
        format!("{}:{}", RATE_LIMIT_PREFIX, key)
    }
}

#[async_trait]
impl RateLimiterService for CounterRateLimiter {
    async fn is_rate_limited(&self, ctx: &RequestContext) -> bool {
        match self.permits_per_second {
            Some(permits) => !self.try_acquire(&ctx.cache_key, permits).await,
            None => false,
        }
    }

    async fn try_acquire(&self, key: &str, permits_per_second: u64) -> bool {
        let counter = Self::counter_key(key);
        match with_timeout(
            "rate limit increment",
            self.timeout,
            self.store.incr_with_expire(&counter, WINDOW),
        )
        .await
        {
            Ok(count) => {
                let acquired = count <= permits_per_second;
                debug!(key = %key, count, limit = permits_per_second, acquired, "rate limit check");
                acquired
            }
            Err(e) => {
                warn!(key = %key, error = %e, "rate limiter unavailable, admitting request");
                true
            }
        }
    }

    async fn current_qps(&self, key: &str) -> u64 {
        let counter = Self::counter_key(key);
        match with_timeout("rate limit read", self.timeout, self.store.get_count(&counter)).await {
            Ok(count) => count.unwrap_or(0),
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read rate limit counter");
                0
            }
        }
    }
}
