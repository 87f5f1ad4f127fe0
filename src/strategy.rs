//! Heat level to dispatch decision mapping.
//!
//! The table is built once from [`StrategyConfig`] and read lock-free on every request.
//! A configuration entry that does not name a known mode or ttl level is replaced by the
//! safe value (`NONE` / `SHORT`) and logged; the remaining entries are unaffected.

use crate::config::StrategyConfig;
use crate::types::{CacheMode, DispatchDecision, HotspotLevel, TtlLevel};
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One decision per heat level, indexed by [`HotspotLevel::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyTable {
    entries: [DispatchDecision; 4],
}

impl StrategyTable {
    pub fn from_config(config: &StrategyConfig) -> Self {
        let mut entries = [DispatchDecision::bypass(); 4];
        for level in HotspotLevel::ALL {
            let (mode_name, ttl_name) = config.names_for(level);
            let cache_mode = mode_name.parse::<CacheMode>().unwrap_or_else(|e| {
                warn!(level = %level, error = %e, fallback = %CacheMode::None, "unknown cache mode in strategy config");
                CacheMode::None
            });
            let ttl_level = ttl_name.parse::<TtlLevel>().unwrap_or_else(|e| {
                warn!(level = %level, error = %e, fallback = %TtlLevel::Short, "unknown ttl level in strategy config");
                TtlLevel::Short
            });
            entries[level.index()] = DispatchDecision::new(cache_mode, ttl_level);
        }
        Self { entries }
    }

    pub fn get(&self, level: HotspotLevel) -> DispatchDecision {
        self.entries[level.index()]
    }

    /// `(level, decision)` pairs from coldest to hottest.
    pub fn iter(&self) -> impl Iterator<Item = (HotspotLevel, DispatchDecision)> + '_ {
        HotspotLevel::ALL
            .into_iter()
            .map(move |level| (level, self.get(level)))
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::from_config(&StrategyConfig::default())
    }
}

pub struct DecisionStrategyEngine {
    table: ArcSwap<StrategyTable>,
}

impl DecisionStrategyEngine {
    pub fn new(config: &StrategyConfig) -> Self {
        let table = StrategyTable::from_config(config);
        log_table("decision strategy table initialized", &table);
        Self {
            table: ArcSwap::from_pointee(table),
        }
    }

    pub fn decide(&self, level: HotspotLevel) -> DispatchDecision {
        let decision = self.table.load().get(level);
        debug!(level = %level, decision = %decision, "dispatch decision");
        decision
    }

    /// Absent level decides as `Cold`.
    pub fn decide_opt(&self, level: Option<HotspotLevel>) -> DispatchDecision {
        self.decide(level.unwrap_or(HotspotLevel::Cold))
    }

    /// Snapshot of the table in effect.
    pub fn table(&self) -> Arc<StrategyTable> {
        self.table.load_full()
    }

    /// Build a new table and swap it in. Concurrent readers observe either the old or
    /// the new table, never a mix.
    pub fn rebuild(&self, config: &StrategyConfig) {
        let table = StrategyTable::from_config(config);
        log_table("decision strategy table rebuilt", &table);
        self.table.store(Arc::new(table));
    }
}

impl Default for DecisionStrategyEngine {
    fn default() -> Self {
        Self::new(&StrategyConfig::default())
    }
}

fn log_table(msg: &'static str, table: &StrategyTable) {
    info!(
        cold = %table.get(HotspotLevel::Cold),
        warm = %table.get(HotspotLevel::Warm),
        hot = %table.get(HotspotLevel::Hot),
        extremely_hot = %table.get(HotspotLevel::ExtremelyHot),
        "{}",
        msg
    );
}
