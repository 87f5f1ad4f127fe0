//! Shared cache tier over a [`KeyValueStore`].

use super::tier::CacheTier;
use crate::config::{CacheConfig, TtlTable};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};
use crate::store::{with_timeout, KeyValueStore, StoreResult};
use crate::types::TtlLevel;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct RemoteCacheClient {
    store: Arc<dyn KeyValueStore>,
    ttl: TtlTable,
    timeout: Duration,
    breaker: Option<CircuitBreaker>,
}

impl RemoteCacheClient {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: TtlTable, timeout: Duration) -> Self {
        Self {
            store,
            ttl,
            timeout,
            breaker: None,
        }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &CacheConfig) -> Self {
        let client = Self::new(store, config.remote, config.remote_timeout());
        match CircuitBreakerConfig::for_remote_tier(config) {
            Some(cfg) => client.with_circuit_breaker(cfg),
            None => client,
        }
    }

    pub fn with_circuit_breaker(mut self, cfg: CircuitBreakerConfig) -> Self {
        self.breaker = Some(CircuitBreaker::new(cfg));
        self
    }

    pub fn ttl_table(&self) -> TtlTable {
        self.ttl
    }

    pub fn circuit_breaker(&self) -> Option<&CircuitBreaker> {
        self.breaker.as_ref()
    }

    /// Health check; never fails, a down or slow store reads as unavailable.
    pub async fn is_available(&self) -> bool {
        match with_timeout("remote ping", self.timeout, self.store.ping()).await {
            Ok(()) => true,
            Err(e) => {
                debug!(store = self.store.name(), error = %e, "remote tier unavailable");
                false
            }
        }
    }

    async fn guarded<T, F>(&self, op: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        if let Some(breaker) = &self.breaker {
            breaker.allow()?;
        }
        let result = with_timeout(op, self.timeout, fut).await;
        if let Some(breaker) = &self.breaker {
            match &result {
                Ok(_) => breaker.on_success(),
                Err(_) => breaker.on_failure(),
            }
        }
        result
    }
}

#[async_trait]
impl CacheTier for RemoteCacheClient {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.guarded("remote get", self.store.get(key)).await
    }

    async fn put(&self, key: &str, value: &[u8], ttl_level: TtlLevel) -> StoreResult<()> {
        let ttl = self.ttl.duration(ttl_level);
        self.guarded("remote put", self.store.set(key, value, ttl))
            .await
    }

    async fn invalidate(&self, key: &str) -> StoreResult<()> {
        self.guarded("remote invalidate", self.store.delete(key))
            .await
            .map(|_| ())
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
