//! # hotkey-scheduler
//!
//! 热点感知的请求调度层：按访问热度为每个请求选择缓存层级与保留时长。
//!
//! Heat-aware request scheduling for read-heavy services. Every request is counted in
//! two sliding windows, classified into a heat level, mapped to a caching strategy and
//! then served from the in-process tier, the shared remote tier or the source of truth.
//!
//! ## Overview
//!
//! Hot keys (a flash-sale product, a trending post) are cached aggressively in both
//! tiers with long retention; warm keys only in the shared tier; cold keys are not cached
//! at all, so the tiers hold what is actually in demand. Counting lives in a shared
//! counter store (Redis), so every instance classifies a key the same way.
//!
//! ## Core Philosophy
//!
//! - **Fail-open**: counter or tier outages degrade caching, never the request
//! - **Configuration as data**: thresholds and strategy tables are values, swapped whole on reload
//! - **At most one load**: the loader is an `FnOnce`, called only when no tier can serve the key
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hotkey_scheduler::{store, RequestContext, SchedulerConfig, SchedulerFacade};
//!
//! #[tokio::main]
//! async fn main() -> hotkey_scheduler::Result<()> {
//!     let config = SchedulerConfig::from_file("scheduler.yaml")?;
//!     let conn = store::connect("redis://127.0.0.1/").await?;
//!     let facade = SchedulerFacade::builder()
//!         .config(config)
//!         .redis(conn)
//!         .build()?;
//!
//!     let mut ctx = RequestContext::new("42").with_biz_type("product");
//!     let product = facade
//!         .process(&mut ctx, || async { Some("product 42 from db".to_string()) })
//!         .await?
//!         .into_value();
//!     println!("{:?} served as {:?}", product, ctx.hotspot_level);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`statistics`] | Dual-window access counting over the shared counter store |
//! | [`hotspot`] | Heat level classification from counts |
//! | [`strategy`] | Heat level to `(cache mode, ttl level)` table |
//! | [`cache`] | Local and remote tiers, read-through access proxy |
//! | [`facade`] | End-to-end pipeline with policy hooks |
//! | [`policy`] | Classification, degrade, rate limiting, cache admission |
//! | [`store`] | Counter and key-value store abstractions (Redis, in-memory) |
//! | [`config`] | YAML configuration and hot reload |
//! | [`resilience`] | Circuit breaker for the remote tier |
//! | [`types`] | Values passed between the stages |

pub mod cache;
pub mod config;
pub mod facade;
pub mod hotspot;
pub mod policy;
pub mod resilience;
pub mod statistics;
pub mod store;
pub mod strategy;
pub mod types;

// Re-export main types for convenience
pub use cache::{CacheAccessProxy, ProxyStats};
pub use config::SchedulerConfig;
pub use facade::{ProcessOutcome, SchedulerFacade, SchedulerFacadeBuilder};
pub use hotspot::HotspotDetector;
pub use statistics::AccessStatisticsService;
pub use strategy::DecisionStrategyEngine;
pub use types::{
    CacheMode, DispatchDecision, HotspotLevel, RequestContext, RequestType, StatResult, TtlLevel,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
