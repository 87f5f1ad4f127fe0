//! 类型系统模块：定义调度管线各阶段之间传递的核心数据类型。
//!
//! # Types Module
//!
//! This module defines the values that flow between the pipeline stages. All of them
//! are small, immutable (or caller-owned) and cheap to copy.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`StatResult`] | Dual-window access counts produced by the statistics service |
//! | [`HotspotLevel`] | Discrete heat classification (cold → extremely hot) |
//! | [`CacheMode`] | Which cache tiers participate in a request |
//! | [`TtlLevel`] | Retention cost class, resolved to seconds per tier |
//! | [`DispatchDecision`] | `(CacheMode, TtlLevel)` strategy tuple |
//! | [`RequestContext`] | Per-request envelope owned by the caller |
//!
//! ## Example
//!
//! ```rust
//! use hotkey_scheduler::types::{CacheMode, DispatchDecision, HotspotLevel, TtlLevel};
//!
//! let decision = DispatchDecision::new(CacheMode::LocalAndRemote, TtlLevel::Long);
//! assert!(decision.uses_local() && decision.uses_remote());
//! assert!(HotspotLevel::ExtremelyHot > HotspotLevel::Warm);
//! ```

pub mod context;
pub mod decision;
pub mod level;
pub mod stat;

pub use context::{RequestContext, RequestType};
pub use decision::{CacheMode, DispatchDecision, ParseEnumError, TtlLevel};
pub use level::HotspotLevel;
pub use stat::{AccessStatistics, StatResult};
