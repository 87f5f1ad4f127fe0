//! Heat classification levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// How frequently a key is being accessed, ordered by increasing heat.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HotspotLevel {
    #[default]
    Cold,
    Warm,
    Hot,
    ExtremelyHot,
}

impl HotspotLevel {
    /// All levels, coldest first.
    pub const ALL: [HotspotLevel; 4] = [
        HotspotLevel::Cold,
        HotspotLevel::Warm,
        HotspotLevel::Hot,
        HotspotLevel::ExtremelyHot,
    ];

    /// Dense index, usable for fixed-size per-level tables.
    pub const fn index(self) -> usize {
        match self {
            HotspotLevel::Cold => 0,
            HotspotLevel::Warm => 1,
            HotspotLevel::Hot => 2,
            HotspotLevel::ExtremelyHot => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HotspotLevel::Cold => "COLD",
            HotspotLevel::Warm => "WARM",
            HotspotLevel::Hot => "HOT",
            HotspotLevel::ExtremelyHot => "EXTREMELY_HOT",
        }
    }
}

impl fmt::Display for HotspotLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_totally_ordered() {
        assert!(HotspotLevel::Cold < HotspotLevel::Warm);
        assert!(HotspotLevel::Warm < HotspotLevel::Hot);
        assert!(HotspotLevel::Hot < HotspotLevel::ExtremelyHot);
        assert_eq!(
            HotspotLevel::ALL.iter().max(),
            Some(&HotspotLevel::ExtremelyHot)
        );
    }

    #[test]
    fn index_matches_position_in_all() {
        for (i, level) in HotspotLevel::ALL.iter().enumerate() {
            assert_eq!(level.index(), i);
        }
    }

    #[test]
    fn serde_uses_upper_snake_names() {
        let json = serde_json::to_string(&HotspotLevel::ExtremelyHot).unwrap();
        assert_eq!(json, "\"EXTREMELY_HOT\"");
        assert_eq!(HotspotLevel::Warm.to_string(), "WARM");
    }
}
