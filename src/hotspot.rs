//! Heat classification of dual-window counts.
//!
//! Levels are checked hottest first; a level is entered when either window reaches its
//! threshold (inclusive). The classification is pure: no I/O and no locks, the
//! thresholds are read through an [`ArcSwap`] snapshot and replaced whole on reload.

use crate::config::HotspotConfig;
use crate::types::{HotspotLevel, StatResult};
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{debug, info};

/// Evaluation order: first match wins.
const HOTTEST_FIRST: [HotspotLevel; 3] = [
    HotspotLevel::ExtremelyHot,
    HotspotLevel::Hot,
    HotspotLevel::Warm,
];

pub struct HotspotDetector {
    config: ArcSwap<HotspotConfig>,
}

impl HotspotDetector {
    pub fn new(config: HotspotConfig) -> Self {
        info!(
            extremely_hot = ?(config.extremely_hot_short_threshold, config.extremely_hot_long_threshold),
            hot = ?(config.hot_short_threshold, config.hot_long_threshold),
            warm = ?(config.warm_short_threshold, config.warm_long_threshold),
            "hotspot detector initialized"
        );
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    pub fn detect(&self, stat: &StatResult) -> HotspotLevel {
        let config = self.config.load();
        let level = HOTTEST_FIRST
            .into_iter()
            .find(|level| {
                config
                    .threshold_for(*level)
                    .is_some_and(|t| t.is_met(stat.count_short, stat.count_long))
            })
            .unwrap_or(HotspotLevel::Cold);
        debug!(
            count_short = stat.count_short,
            count_long = stat.count_long,
            level = %level,
            "hotspot level detected"
        );
        level
    }

    /// Absent statistics classify as `Cold`.
    pub fn detect_opt(&self, stat: Option<&StatResult>) -> HotspotLevel {
        stat.map(|s| self.detect(s)).unwrap_or(HotspotLevel::Cold)
    }

    /// Long-window threshold of a level; 0 for `Cold`.
    pub fn threshold(&self, level: HotspotLevel) -> u64 {
        self.config
            .load()
            .threshold_for(level)
            .map(|t| t.long)
            .unwrap_or(0)
    }

    /// Current thresholds.
    pub fn config(&self) -> Arc<HotspotConfig> {
        self.config.load_full()
    }

    /// Replace all thresholds at once.
    pub fn reload(&self, config: HotspotConfig) {
        info!(
            extremely_hot = ?(config.extremely_hot_short_threshold, config.extremely_hot_long_threshold),
            hot = ?(config.hot_short_threshold, config.hot_long_threshold),
            warm = ?(config.warm_short_threshold, config.warm_long_threshold),
            "hotspot thresholds reloaded"
        );
        self.config.store(Arc::new(config));
    }
}

impl Default for HotspotDetector {
    fn default() -> Self {
        Self::new(HotspotConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(short: u64, long: u64) -> HotspotLevel {
        HotspotDetector::default().detect(&StatResult::new(short, long))
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert_eq!(detect(5, 0), HotspotLevel::Warm);
        assert_eq!(detect(4, 59), HotspotLevel::Cold);
        assert_eq!(detect(0, 60), HotspotLevel::Warm);
        assert_eq!(detect(20, 0), HotspotLevel::Hot);
        assert_eq!(detect(19, 299), HotspotLevel::Warm);
        assert_eq!(detect(0, 300), HotspotLevel::Hot);
        assert_eq!(detect(100, 0), HotspotLevel::ExtremelyHot);
        assert_eq!(detect(0, 1000), HotspotLevel::ExtremelyHot);
    }

    #[test]
    fn either_window_is_sufficient() {
        assert_eq!(detect(150, 10), HotspotLevel::ExtremelyHot);
        assert_eq!(detect(1, 1200), HotspotLevel::ExtremelyHot);
        assert_eq!(detect(25, 50), HotspotLevel::Hot);
    }

    #[test]
    fn absent_or_empty_stats_are_cold() {
        let detector = HotspotDetector::default();
        assert_eq!(detector.detect_opt(None), HotspotLevel::Cold);
        assert_eq!(
            detector.detect_opt(Some(&StatResult::empty())),
            HotspotLevel::Cold
        );
    }

    #[test]
    fn classification_is_monotone() {
        let detector = HotspotDetector::default();
        let mut previous = HotspotLevel::Cold;
        for n in 0..1500u64 {
            let level = detector.detect(&StatResult::new(n / 10, n));
            assert!(level >= previous, "level dropped at {}", n);
            previous = level;
        }
        assert_eq!(previous, HotspotLevel::ExtremelyHot);
    }

    #[test]
    fn long_threshold_per_level() {
        let detector = HotspotDetector::default();
        assert_eq!(detector.threshold(HotspotLevel::Cold), 0);
        assert_eq!(detector.threshold(HotspotLevel::Warm), 60);
        assert_eq!(detector.threshold(HotspotLevel::Hot), 300);
        assert_eq!(detector.threshold(HotspotLevel::ExtremelyHot), 1000);
    }

    #[test]
    fn reload_replaces_thresholds() {
        let detector = HotspotDetector::default();
        assert_eq!(detector.detect(&StatResult::new(30, 0)), HotspotLevel::Hot);
        detector.reload(HotspotConfig::default().with_threshold(HotspotLevel::Hot, 50, 300));
        assert_eq!(detector.detect(&StatResult::new(30, 0)), HotspotLevel::Warm);
        assert_eq!(detector.config().hot_short_threshold, 50);
    }
}
