//! Access count results

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Access counts for one key within the short (burst) and long (sustained) windows,
/// as observed at the moment of recording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatResult {
    pub count_short: u64,
    pub count_long: u64,
}

impl StatResult {
    pub const fn new(count_short: u64, count_long: u64) -> Self {
        Self {
            count_short,
            count_long,
        }
    }

    /// Zero counts, returned when statistics are unavailable or the input was invalid.
    pub const fn empty() -> Self {
        Self::new(0, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.count_short == 0 && self.count_long == 0
    }
}

/// Long-window snapshot served to callers of the single-window compat API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessStatistics {
    pub cache_key: String,
    pub access_count: u64,
    pub window_size: Duration,
    /// Accesses per second over the long window.
    pub average_access_rate: f64,
}

impl AccessStatistics {
    pub fn new(cache_key: impl Into<String>, access_count: u64, window_size: Duration) -> Self {
        let secs = window_size.as_secs_f64();
        let average_access_rate = if secs > 0.0 {
            access_count as f64 / secs
        } else {
            0.0
        };
        Self {
            cache_key: cache_key.into(),
            access_count,
            window_size,
            average_access_rate,
        }
    }

    pub fn empty(cache_key: impl Into<String>, window_size: Duration) -> Self {
        Self::new(cache_key, 0, window_size)
    }
}
