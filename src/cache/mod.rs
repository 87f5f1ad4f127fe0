//! 缓存访问模块：按调度决策在本地与远程两级缓存之间执行读穿透访问。
//!
//! # Cache Access Module
//!
//! Executes a [`DispatchDecision`](crate::types::DispatchDecision) against two cache
//! tiers and the caller's loader.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheAccessProxy`] | Read-through dispatch over the tiers, with backfill and invalidation |
//! | [`CacheTier`] | Trait for a tier holding serialized values, ttl resolved per [`TtlLevel`](crate::types::TtlLevel) |
//! | [`LocalCacheClient`] | In-process bounded LRU with per-entry expiry |
//! | [`RemoteCacheClient`] | Shared tier over a [`KeyValueStore`](crate::store::KeyValueStore), with timeout and optional breaker |
//! | [`ProxyStats`] | Hit / miss / load / error counters |
//!
//! ## Dispatch
//!
//! | Cache mode | Read path | On miss |
//! |------------|-----------|---------|
//! | `NONE` | none | loader only, nothing written |
//! | `LOCAL_ONLY` | local | loader, write local |
//! | `REMOTE_ONLY` | remote | loader, write remote |
//! | `LOCAL_AND_REMOTE` | local, then remote (a hit backfills local) | loader, write remote then local |
//!
//! Tier failures are logged and treated as a miss (read) or skipped (write); they never
//! surface to the caller. Values the loader returns as `None` are not cached.
//!
//! ## Example
//!
//! ```rust
//! use hotkey_scheduler::cache::{CacheAccessProxy, LocalCacheClient, RemoteCacheClient};
//! use hotkey_scheduler::config::CacheConfig;
//! use hotkey_scheduler::store::MemoryKeyValueStore;
//! use hotkey_scheduler::types::{CacheMode, DispatchDecision, TtlLevel};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let config = CacheConfig::default();
//! let proxy = CacheAccessProxy::new(
//!     Arc::new(LocalCacheClient::from_config(&config)),
//!     Arc::new(RemoteCacheClient::from_config(Arc::new(MemoryKeyValueStore::new()), &config)),
//! );
//! let decision = DispatchDecision::new(CacheMode::LocalAndRemote, TtlLevel::Normal);
//! let value = proxy
//!     .access("product:42", || async { Some("from db".to_string()) }, Some(decision))
//!     .await;
//! assert_eq!(value.as_deref(), Some("from db"));
//! assert_eq!(proxy.stats().loads, 1);
//! # });
//! ```

mod local;
mod proxy;
mod remote;
mod tier;

pub use local::LocalCacheClient;
pub use proxy::{CacheAccessProxy, ProxyStats, WritePolicy};
pub use remote::RemoteCacheClient;
pub use tier::{CacheTier, TierRead};
