//! 弹性模式模块：为远程缓存层提供熔断保护。
//!
//! # Resilience Primitives Module
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`circuit_breaker`] | Consecutive-failure breaker that lets the remote tier be skipped while it is down |
//!
//! The breaker is opt-in (`cache.remoteBreakerThreshold > 0`). While open, remote reads
//! and writes fail fast with [`StoreError::Unavailable`], which the cache proxy treats
//! exactly like any other tier failure.
//!
//! ```rust
//! use hotkey_scheduler::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::new(
//!     CircuitBreakerConfig::new()
//!         .with_failure_threshold(5)
//!         .with_cooldown(Duration::from_secs(30)),
//! );
//! if breaker.allow().is_ok() {
//!     // call the remote tier, then report the outcome
//!     breaker.on_success();
//! }
//! ```
//!
//! [`StoreError::Unavailable`]: crate::store::StoreError::Unavailable

pub mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot};
