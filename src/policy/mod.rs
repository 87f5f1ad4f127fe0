//! 策略钩子模块：请求分类、降级、限流与缓存准入。
//!
//! # Policy Hooks
//!
//! Traits consulted by [`SchedulerFacade`](crate::SchedulerFacade) around the core
//! statistics → detection → decision → access pipeline, each with a default
//! implementation.
//!
//! | Hook | Default | Effect |
//! |------|---------|--------|
//! | [`RequestClassifier`] | [`DefaultRequestClassifier`] | request type; whether it is counted and cacheable |
//! | [`DegradeService`] | [`DefaultDegradeService`] | short-circuit with `Degraded` by level and type |
//! | [`RateLimiterService`] | [`CounterRateLimiter`] | short-circuit with `RateLimited` over a per-key budget |
//! | [`CacheAdmissionControl`] | [`DefaultCacheAdmissionControl`] | read-only access when a key is not yet worth caching |

mod admission;
mod classifier;
mod degrade;
mod rate_limit;

pub use admission::{CacheAdmissionControl, DefaultCacheAdmissionControl};
pub use classifier::{DefaultRequestClassifier, RequestClassifier};
pub use degrade::{DefaultDegradeService, DegradeService};
pub use rate_limit::{CounterRateLimiter, RateLimiterService};
