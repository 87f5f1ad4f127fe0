//! 共享存储模块：计数存储与远程缓存存储的抽象及 Redis / 内存实现。
//!
//! # Shared Store Module
//!
//! The scheduler talks to two kinds of externally owned, shared stores. Both are
//! reached only through single-key atomic operations; no client-side locks are held.
//!
//! | Trait | Used by | Operations |
//! |-------|---------|------------|
//! | [`CounterStore`] | access statistics, rate limiter | atomic increment-with-first-expiry, read, delete |
//! | [`KeyValueStore`] | remote cache tier | get / set with expiry / delete / ping |
//!
//! ## Implementations
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RedisCounterStore`] | Lua script running `INCR` + conditional `PEXPIRE` in one round trip |
//! | [`RedisKeyValueStore`] | `GET` / `SET PX` / `DEL` over a shared connection manager |
//! | [`MemoryCounterStore`] | Single-process stand-in with identical expiry semantics |
//! | [`MemoryKeyValueStore`] | Single-process stand-in for the remote tier |
//!
//! The memory implementations can simulate outages and latency, which is how the
//! fail-open paths are exercised in tests.

mod memory;
mod redis;

pub use self::memory::{MemoryCounterStore, MemoryKeyValueStore};
pub use self::redis::{connect, RedisCounterStore, RedisKeyValueStore};

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Failures of a shared store. Recovered at the component boundary that issued the
/// call; never seen above the cache proxy.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis command failed: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("{op} timed out after {after_ms}ms")]
    Timeout { op: &'static str, after_ms: u64 },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected value at '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Shared counters with window semantics.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment `key` and, only when the increment created the counter (result is 1),
    /// set its expiry to `ttl`. Must be a single atomic store-side operation.
    async fn incr_with_expire(&self, key: &str, ttl: Duration) -> StoreResult<u64>;

    /// Read a counter without incrementing it.
    async fn get_count(&self, key: &str) -> StoreResult<Option<u64>>;

    async fn delete_counter(&self, key: &str) -> StoreResult<bool>;

    fn name(&self) -> &'static str;
}

/// Byte-oriented shared key-value store backing the remote cache tier.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()>;

    async fn delete(&self, key: &str) -> StoreResult<bool>;

    async fn ping(&self) -> StoreResult<()>;

    fn name(&self) -> &'static str;
}

/// Bound a store call; an elapsed deadline becomes [`StoreError::Timeout`].
pub async fn with_timeout<T, F>(op: &'static str, limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            op,
            after_ms: limit.as_millis() as u64,
        }),
    }
}

/// Expiry in whole milliseconds, rounded up and never zero.
pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    let nanos = ttl.as_nanos();
    let millis = (nanos + 999_999) / 1_000_000;
    millis.clamp(1, u64::MAX as u128) as u64
}
