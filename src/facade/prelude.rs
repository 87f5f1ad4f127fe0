//! Minimal prelude for application code.
//!
//! Goal: reduce import noise without hiding important concepts.

pub use crate::config::SchedulerConfig;
pub use crate::facade::{ProcessOutcome, SchedulerFacade, SchedulerFacadeBuilder};
pub use crate::types::{
    CacheMode, DispatchDecision, HotspotLevel, RequestContext, RequestType, StatResult, TtlLevel,
};
