//! Cache strategy tuple and its enumerations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which cache tiers participate in serving a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheMode {
    /// Bypass both tiers, always call the loader.
    None,
    /// In-process tier only.
    LocalOnly,
    /// Shared tier only.
    RemoteOnly,
    /// Local first, then remote, then the loader.
    LocalAndRemote,
}

/// Retention cost class. Concrete seconds are resolved per tier from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TtlLevel {
    Short,
    Normal,
    Long,
}

/// Error returned when a configured enum name does not match any variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl CacheMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheMode::None => "NONE",
            CacheMode::LocalOnly => "LOCAL_ONLY",
            CacheMode::RemoteOnly => "REMOTE_ONLY",
            CacheMode::LocalAndRemote => "LOCAL_AND_REMOTE",
        }
    }
}

impl FromStr for CacheMode {
    type Err = ParseEnumError;

    // Names match exactly, the way they appear in configuration files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(CacheMode::None),
            "LOCAL_ONLY" => Ok(CacheMode::LocalOnly),
            "REMOTE_ONLY" => Ok(CacheMode::RemoteOnly),
            "LOCAL_AND_REMOTE" => Ok(CacheMode::LocalAndRemote),
            other => Err(ParseEnumError {
                kind: "cache mode",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TtlLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            TtlLevel::Short => "SHORT",
            TtlLevel::Normal => "NORMAL",
            TtlLevel::Long => "LONG",
        }
    }
}

impl FromStr for TtlLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHORT" => Ok(TtlLevel::Short),
            "NORMAL" => Ok(TtlLevel::Normal),
            "LONG" => Ok(TtlLevel::Long),
            other => Err(ParseEnumError {
                kind: "ttl level",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TtlLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caching strategy chosen for one heat level.
///
/// This is an intent signal only: it never carries a concrete number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DispatchDecision {
    pub cache_mode: CacheMode,
    pub ttl_level: TtlLevel,
}

impl DispatchDecision {
    pub const fn new(cache_mode: CacheMode, ttl_level: TtlLevel) -> Self {
        Self {
            cache_mode,
            ttl_level,
        }
    }

    /// The strategy used for cold keys and degraded paths: no caching at all.
    pub const fn bypass() -> Self {
        Self::new(CacheMode::None, TtlLevel::Short)
    }

    pub fn uses_local(&self) -> bool {
        matches!(
            self.cache_mode,
            CacheMode::LocalOnly | CacheMode::LocalAndRemote
        )
    }

    pub fn uses_remote(&self) -> bool {
        matches!(
            self.cache_mode,
            CacheMode::RemoteOnly | CacheMode::LocalAndRemote
        )
    }
}

impl fmt::Display for DispatchDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.cache_mode, self.ttl_level)
    }
}
