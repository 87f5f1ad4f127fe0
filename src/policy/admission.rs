use crate::types::{HotspotLevel, RequestContext, StatResult};
use tracing::debug;

/// Decides whether a loaded value may be written into the cache tiers.
pub trait CacheAdmissionControl: Send + Sync {
    fn allow_cache_write(&self, ctx: &RequestContext, stat: &StatResult) -> bool;
}

/// Admits extremely hot keys unconditionally, anything else once its long-window count
/// reaches `min_access_threshold`. Keeps one-off keys from churning the tiers.
#[derive(Debug, Clone)]
pub struct DefaultCacheAdmissionControl {
    min_access_threshold: u64,
}

impl DefaultCacheAdmissionControl {
    pub fn new(min_access_threshold: u64) -> Self {
        Self {
            min_access_threshold,
        }
    }
}

impl Default for DefaultCacheAdmissionControl {
    fn default() -> Self {
        Self::new(5)
    }
}

impl CacheAdmissionControl for DefaultCacheAdmissionControl {
    fn allow_cache_write(&self, ctx: &RequestContext, stat: &StatResult) -> bool {
        if ctx.hotspot_level == Some(HotspotLevel::ExtremelyHot) {
            return true;
        }
        let allowed = stat.count_long >= self.min_access_threshold;
        debug!(
            key = %ctx.cache_key,
            count_long = stat.count_long,
            threshold = self.min_access_threshold,
            allowed,
            "cache admission"
        );
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extremely_hot_is_always_admitted() {
        let admission = DefaultCacheAdmissionControl::default();
        let mut ctx = RequestContext::new("k");
        ctx.hotspot_level = Some(HotspotLevel::ExtremelyHot);
        assert!(admission.allow_cache_write(&ctx, &StatResult::empty()));
    }

    #[test]
    fn threshold_is_inclusive() {
        let admission = DefaultCacheAdmissionControl::new(5);
        let mut ctx = RequestContext::new("k");
        ctx.hotspot_level = Some(HotspotLevel::Warm);
        assert!(!admission.allow_cache_write(&ctx, &StatResult::new(4, 4)));
        assert!(admission.allow_cache_write(&ctx, &StatResult::new(0, 5)));
    }
}
