use crate::types::{RequestContext, RequestType};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::info;

/// Load shedding by request type.
pub trait DegradeService: Send + Sync {
    fn should_degrade(&self, ctx: &RequestContext) -> bool;

    fn degrade_level(&self) -> u8;

    fn is_system_overloaded(&self) -> bool {
        self.degrade_level() > 0
    }
}

/// Operator-driven degrade level.
///
/// | Level | Degraded request types |
/// |-------|------------------------|
/// | 0 | none |
/// | 1 | personalized reads |
/// | 2 | personalized reads, non-critical writes |
/// | 3 | everything except strong-consistency writes |
#[derive(Debug, Default)]
pub struct DefaultDegradeService {
    level: AtomicU8,
}

impl DefaultDegradeService {
    pub const MAX_LEVEL: u8 = 3;

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level; values above [`Self::MAX_LEVEL`] are clamped.
    pub fn set_degrade_level(&self, level: u8) {
        let level = level.min(Self::MAX_LEVEL);
        self.level.store(level, Ordering::Relaxed);
        info!(level, "degrade level changed");
    }
}

impl DegradeService for DefaultDegradeService {
    fn should_degrade(&self, ctx: &RequestContext) -> bool {
        let request_type = ctx.request_type.unwrap_or(RequestType::HighReuseRead);
        if request_type == RequestType::StrongConsistencyWrite {
            return false;
        }
        match self.degrade_level() {
            0 => false,
            1 => request_type == RequestType::PersonalizedRead,
            2 => matches!(
                request_type,
                RequestType::PersonalizedRead | RequestType::NonCriticalWrite
            ),
            _ => true,
        }
    }

    fn degrade_level(&self) -> u8 {
        self.level.load(Ordering::Relaxed)
    }
}
