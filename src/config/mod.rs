//! 调度层配置模块：集中管理统计窗口、热点阈值、策略映射与缓存 TTL。
//!
//! # Scheduler Configuration
//!
//! All tunables of the pipeline live in one [`SchedulerConfig`] value, grouped by the
//! stage that consumes them. Every field has a default, so an empty document is a valid
//! configuration.
//!
//! | Section | Consumer |
//! |---------|----------|
//! | [`StatConfig`] | access statistics (windows, timeouts, fail-open switch, key prefix) |
//! | [`HotspotConfig`] | hotspot detector thresholds |
//! | [`StrategyConfig`] | decision engine (cache mode / ttl level names per level) |
//! | [`CacheConfig`] | tier clients (capacity, per-tier TTL seconds, remote breaker) |
//! | [`PolicyConfig`] | rate limiter and cache admission hooks |
//!
//! ## YAML layout
//!
//! Keys are camelCase. The document may optionally be nested under a top-level
//! `scheduler:` key.
//!
//! ```yaml
//! scheduler:
//!   stat:
//!     shortWindowSeconds: 0.5
//!     longWindowSeconds: 120
//!     keyPrefix: stat_prod
//!   hotspot:
//!     hotShortThreshold: 30
//!   strategy:
//!     warmCacheMode: LOCAL_ONLY
//! ```
//!
//! ```rust
//! use hotkey_scheduler::config::SchedulerConfig;
//!
//! let cfg = SchedulerConfig::from_yaml_str("stat:\n  keyPrefix: stat_test\n").unwrap();
//! assert_eq!(cfg.stat.key_prefix, "stat_test");
//! assert_eq!(cfg.stat.long_window_seconds, 120);
//! ```

pub mod watcher;

use crate::types::{HotspotLevel, TtlLevel};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub use watcher::{ConfigWatcher, WatcherHandle};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    pub stat: StatConfig,
    pub hotspot: HotspotConfig,
    pub strategy: StrategyConfig,
    pub cache: CacheConfig,
    pub policy: PolicyConfig,
}

/// Access statistics settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatConfig {
    /// Burst window. Fractional values are allowed (0.5 = 500ms, for flash sales).
    pub short_window_seconds: f64,
    /// Sustained-demand window.
    pub long_window_seconds: u64,
    /// Per-call bound on counter store operations, in milliseconds.
    pub redis_timeout: u64,
    /// Extra attempts for read-only counter lookups.
    pub max_retries: u32,
    /// When true, store failures yield an empty result instead of an error.
    pub fallback_enabled: bool,
    /// Counter key prefix, e.g. `stat_prod` / `stat_test` per environment.
    pub key_prefix: String,
}

impl Default for StatConfig {
    fn default() -> Self {
        Self {
            short_window_seconds: 2.0,
            long_window_seconds: 120,
            redis_timeout: 3000,
            max_retries: 2,
            fallback_enabled: true,
            key_prefix: "stat".to_string(),
        }
    }
}

impl StatConfig {
    pub fn short_window(&self) -> Duration {
        Duration::from_secs_f64(self.short_window_seconds)
    }

    pub fn long_window(&self) -> Duration {
        Duration::from_secs(self.long_window_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.redis_timeout)
    }

    /// Window label used as the last counter key segment: `2s`, `0.5s`.
    pub fn short_window_label(&self) -> String {
        window_label(self.short_window_seconds)
    }

    pub fn long_window_label(&self) -> String {
        format!("{}s", self.long_window_seconds)
    }

    pub fn with_short_window_seconds(mut self, seconds: f64) -> Self {
        self.short_window_seconds = seconds;
        self
    }

    pub fn with_long_window_seconds(mut self, seconds: u64) -> Self {
        self.long_window_seconds = seconds;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_fallback_enabled(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    pub fn with_redis_timeout(mut self, timeout_ms: u64) -> Self {
        self.redis_timeout = timeout_ms;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

fn window_label(seconds: f64) -> String {
    if seconds.fract() == 0.0 {
        format!("{}s", seconds as u64)
    } else {
        format!("{}s", seconds)
    }
}

/// Short/long thresholds for one heat level. Either one alone is sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowThreshold {
    pub short: u64,
    pub long: u64,
}

impl WindowThreshold {
    pub fn is_met(&self, count_short: u64, count_long: u64) -> bool {
        count_short >= self.short || count_long >= self.long
    }
}

/// Hotspot detector thresholds, inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HotspotConfig {
    pub extremely_hot_short_threshold: u64,
    pub extremely_hot_long_threshold: u64,
    pub hot_short_threshold: u64,
    pub hot_long_threshold: u64,
    pub warm_short_threshold: u64,
    pub warm_long_threshold: u64,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            extremely_hot_short_threshold: 100,
            extremely_hot_long_threshold: 1000,
            hot_short_threshold: 20,
            hot_long_threshold: 300,
            warm_short_threshold: 5,
            warm_long_threshold: 60,
        }
    }
}

impl HotspotConfig {
    /// Thresholds of a level; `None` for `Cold`, which has no entry condition.
    pub fn threshold_for(&self, level: HotspotLevel) -> Option<WindowThreshold> {
        match level {
            HotspotLevel::Cold => None,
            HotspotLevel::Warm => Some(WindowThreshold {
                short: self.warm_short_threshold,
                long: self.warm_long_threshold,
            }),
            HotspotLevel::Hot => Some(WindowThreshold {
                short: self.hot_short_threshold,
                long: self.hot_long_threshold,
            }),
            HotspotLevel::ExtremelyHot => Some(WindowThreshold {
                short: self.extremely_hot_short_threshold,
                long: self.extremely_hot_long_threshold,
            }),
        }
    }

    pub fn with_threshold(mut self, level: HotspotLevel, short: u64, long: u64) -> Self {
        match level {
            HotspotLevel::Cold => {}
            HotspotLevel::Warm => {
                self.warm_short_threshold = short;
                self.warm_long_threshold = long;
            }
            HotspotLevel::Hot => {
                self.hot_short_threshold = short;
                self.hot_long_threshold = long;
            }
            HotspotLevel::ExtremelyHot => {
                self.extremely_hot_short_threshold = short;
                self.extremely_hot_long_threshold = long;
            }
        }
        self
    }
}

/// Strategy names per heat level, parsed by the decision engine.
///
/// Kept as strings so a single bad entry can be replaced by a safe default at table
/// build time instead of rejecting the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrategyConfig {
    pub cold_cache_mode: String,
    pub cold_ttl_level: String,
    pub warm_cache_mode: String,
    pub warm_ttl_level: String,
    pub hot_cache_mode: String,
    pub hot_ttl_level: String,
    pub extremely_hot_cache_mode: String,
    pub extremely_hot_ttl_level: String,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            cold_cache_mode: "NONE".to_string(),
            cold_ttl_level: "SHORT".to_string(),
            warm_cache_mode: "REMOTE_ONLY".to_string(),
            warm_ttl_level: "SHORT".to_string(),
            hot_cache_mode: "LOCAL_AND_REMOTE".to_string(),
            hot_ttl_level: "NORMAL".to_string(),
            extremely_hot_cache_mode: "LOCAL_AND_REMOTE".to_string(),
            extremely_hot_ttl_level: "LONG".to_string(),
        }
    }
}

impl StrategyConfig {
    /// `(cache mode name, ttl level name)` configured for a level.
    pub fn names_for(&self, level: HotspotLevel) -> (&str, &str) {
        match level {
            HotspotLevel::Cold => (&self.cold_cache_mode, &self.cold_ttl_level),
            HotspotLevel::Warm => (&self.warm_cache_mode, &self.warm_ttl_level),
            HotspotLevel::Hot => (&self.hot_cache_mode, &self.hot_ttl_level),
            HotspotLevel::ExtremelyHot => (
                &self.extremely_hot_cache_mode,
                &self.extremely_hot_ttl_level,
            ),
        }
    }

    pub fn with_strategy(
        mut self,
        level: HotspotLevel,
        cache_mode: impl Into<String>,
        ttl_level: impl Into<String>,
    ) -> Self {
        let (mode, ttl) = (cache_mode.into(), ttl_level.into());
        match level {
            HotspotLevel::Cold => {
                self.cold_cache_mode = mode;
                self.cold_ttl_level = ttl;
            }
            HotspotLevel::Warm => {
                self.warm_cache_mode = mode;
                self.warm_ttl_level = ttl;
            }
            HotspotLevel::Hot => {
                self.hot_cache_mode = mode;
                self.hot_ttl_level = ttl;
            }
            HotspotLevel::ExtremelyHot => {
                self.extremely_hot_cache_mode = mode;
                self.extremely_hot_ttl_level = ttl;
            }
        }
        self
    }
}

/// Seconds per [`TtlLevel`] for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtlTable {
    pub short_ttl: u64,
    pub normal_ttl: u64,
    pub long_ttl: u64,
}

impl TtlTable {
    pub const fn new(short_ttl: u64, normal_ttl: u64, long_ttl: u64) -> Self {
        Self {
            short_ttl,
            normal_ttl,
            long_ttl,
        }
    }

    pub fn seconds(&self, level: TtlLevel) -> u64 {
        match level {
            TtlLevel::Short => self.short_ttl,
            TtlLevel::Normal => self.normal_ttl,
            TtlLevel::Long => self.long_ttl,
        }
    }

    pub fn duration(&self, level: TtlLevel) -> Duration {
        Duration::from_secs(self.seconds(level))
    }
}

/// Cache tier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Upper bound on in-process entries.
    pub local_max_entries: usize,
    pub local: TtlTable,
    pub remote: TtlTable,
    /// Bound on each remote tier call, in milliseconds.
    pub remote_timeout: u64,
    /// Consecutive remote failures before the tier is skipped; 0 disables the breaker.
    pub remote_breaker_threshold: u32,
    pub remote_breaker_cooldown_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            local_max_entries: 10_000,
            local: TtlTable::new(10, 30, 60),
            remote: TtlTable::new(30, 60, 300),
            remote_timeout: 3000,
            remote_breaker_threshold: 0,
            remote_breaker_cooldown_ms: 30_000,
        }
    }
}

impl CacheConfig {
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout)
    }

    pub fn with_local_max_entries(mut self, max: usize) -> Self {
        self.local_max_entries = max;
        self
    }

    pub fn with_local_ttl(mut self, table: TtlTable) -> Self {
        self.local = table;
        self
    }

    pub fn with_remote_ttl(mut self, table: TtlTable) -> Self {
        self.remote = table;
        self
    }
}

/// Settings of the policy hooks around the core pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolicyConfig {
    /// Per-key permits per second; unset means requests are never rate limited.
    pub rate_limit_permits_per_second: Option<u64>,
    /// Long-window accesses required before a non-extreme key may be written to cache.
    pub min_access_threshold: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            rate_limit_permits_per_second: None,
            min_access_threshold: 5,
        }
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stat(mut self, stat: StatConfig) -> Self {
        self.stat = stat;
        self
    }

    pub fn with_hotspot(mut self, hotspot: HotspotConfig) -> Self {
        self.hotspot = hotspot;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Parse a YAML document and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let doc: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(yaml_error)?;
        let doc = match doc {
            serde_yaml::Value::Null => return Ok(Self::default()),
            serde_yaml::Value::Mapping(mut map) => match map.remove("scheduler") {
                Some(inner) => inner,
                None => serde_yaml::Value::Mapping(map),
            },
            other => other,
        };
        let cfg: Self = serde_yaml::from_value(doc).map_err(yaml_error)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("failed to read config file: {}", e),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_yaml_str(&content)
    }

    /// Structural checks. Unknown strategy names are not errors here; the decision
    /// engine substitutes safe defaults for them.
    pub fn validate(&self) -> Result<()> {
        let stat = &self.stat;
        if !stat.short_window_seconds.is_finite() || stat.short_window_seconds <= 0.0 {
            return Err(invalid(
                "stat.shortWindowSeconds",
                "short window must be a positive number of seconds",
                stat.short_window_seconds,
            ));
        }
        if stat.short_window_seconds > MAX_DURATION_SECONDS as f64 {
            return Err(invalid(
                "stat.shortWindowSeconds",
                "short window must not exceed 30 days",
                stat.short_window_seconds,
            ));
        }
        if stat.long_window_seconds == 0 {
            return Err(invalid(
                "stat.longWindowSeconds",
                "long window must be at least one second",
                stat.long_window_seconds,
            ));
        }
        if stat.long_window_seconds > MAX_DURATION_SECONDS {
            return Err(invalid(
                "stat.longWindowSeconds",
                "long window must not exceed 30 days",
                stat.long_window_seconds,
            ));
        }
        if (stat.long_window_seconds as f64) < stat.short_window_seconds {
            return Err(invalid(
                "stat.longWindowSeconds",
                "long window must not be shorter than the short window",
                stat.long_window_seconds,
            ));
        }
        if stat.key_prefix.is_empty() {
            return Err(invalid("stat.keyPrefix", "key prefix must not be empty", ""));
        }
        if stat.redis_timeout > MAX_DURATION_MILLIS {
            return Err(invalid(
                "stat.redisTimeout",
                "timeout must not exceed 30 days",
                stat.redis_timeout,
            ));
        }

        let h = &self.hotspot;
        if !(h.warm_short_threshold <= h.hot_short_threshold
            && h.hot_short_threshold <= h.extremely_hot_short_threshold)
        {
            return Err(invalid(
                "hotspot",
                "short-window thresholds must increase from WARM to EXTREMELY_HOT",
                format!(
                    "{}/{}/{}",
                    h.warm_short_threshold, h.hot_short_threshold, h.extremely_hot_short_threshold
                ),
            ));
        }
        if !(h.warm_long_threshold <= h.hot_long_threshold
            && h.hot_long_threshold <= h.extremely_hot_long_threshold)
        {
            return Err(invalid(
                "hotspot",
                "long-window thresholds must increase from WARM to EXTREMELY_HOT",
                format!(
                    "{}/{}/{}",
                    h.warm_long_threshold, h.hot_long_threshold, h.extremely_hot_long_threshold
                ),
            ));
        }

        if self.cache.local_max_entries == 0 {
            return Err(invalid(
                "cache.localMaxEntries",
                "local cache capacity must be positive",
                0,
            ));
        }
        let tables = [
            ("cache.local", &self.cache.local),
            ("cache.remote", &self.cache.remote),
        ];
        for (field, table) in tables {
            let ttls = [table.short_ttl, table.normal_ttl, table.long_ttl];
            if ttls.contains(&0) {
                return Err(invalid(
                    field,
                    "ttl seconds must be positive",
                    format!("{:?}", table),
                ));
            }
            if ttls.iter().any(|&ttl| ttl > MAX_DURATION_SECONDS) {
                return Err(invalid(
                    field,
                    "ttl seconds must not exceed 30 days",
                    format!("{:?}", table),
                ));
            }
        }
        for (field, millis) in [
            ("cache.remoteTimeout", self.cache.remote_timeout),
            ("cache.remoteBreakerCooldownMs", self.cache.remote_breaker_cooldown_ms),
        ] {
            if millis > MAX_DURATION_MILLIS {
                return Err(invalid(field, "duration must not exceed 30 days", millis));
            }
        }
        Ok(())
    }
}

/// Upper bound on every window, ttl, timeout and cooldown.
pub const MAX_DURATION_SECONDS: u64 = 30 * 24 * 60 * 60;
const MAX_DURATION_MILLIS: u64 = MAX_DURATION_SECONDS * 1000;

fn invalid(field: &str, message: &str, actual: impl std::fmt::Display) -> Error {
    Error::configuration_with_context(
        message,
        ErrorContext::new()
            .with_field_path(field)
            .with_details(format!("got {}", actual))
            .with_source("config_validation"),
    )
}

fn yaml_error(e: serde_yaml::Error) -> Error {
    Error::configuration_with_context(
        format!("invalid scheduler config: {}", e),
        ErrorContext::new().with_source("config_loader"),
    )
}
