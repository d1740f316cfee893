use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Numeric rank assigned to the default `error` level.
pub const DEFAULT_ERROR_RANK: u32 = 4;

const BUILTIN_LEVELS: [(&str, u32); 4] = [("debug", 1), ("info", 2), ("warn", 3), ("error", 4)];

/// Ordered severity scale used to gate which log calls become notifications.
///
/// The built-in scale is `debug=1, info=2, warn=3, error=4`; custom levels
/// with their own numeric ranks can be merged in at configuration time.
#[derive(Debug, Clone)]
pub struct SeverityMap {
    ranks: HashMap<String, u32>,
}

impl Default for SeverityMap {
    fn default() -> Self {
        let ranks = BUILTIN_LEVELS
            .iter()
            .map(|(name, rank)| ((*name).to_string(), *rank))
            .collect();
        Self { ranks }
    }
}

impl SeverityMap {
    pub fn with_custom_levels(custom: &HashMap<String, u32>) -> Self {
        let mut map = Self::default();
        for (name, rank) in custom {
            map.ranks.insert(name.clone(), *rank);
        }
        map
    }

    /// Numeric rank of a level name, or `None` for unknown levels.
    pub fn rank(&self, level: &str) -> Option<u32> {
        self.ranks.get(level).copied()
    }

    /// Whether a log call at `level` should be reported against `threshold`.
    ///
    /// Unknown level names never report; a missing rank must not compare as
    /// an accept.
    pub fn should_report(&self, level: &str, threshold: u32) -> bool {
        matches!(self.rank(level), Some(rank) if rank >= threshold)
    }
}

/// Severity threshold as supplied in configuration: either a level name or a
/// pre-resolved numeric rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Rank(u32),
    Name(String),
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Name("error".to_string())
    }
}

impl Threshold {
    /// Resolve against a severity map. Unrecognized names are forgiven: a
    /// numeric string is taken as a pre-resolved rank, anything else falls
    /// back to the default `error` rank.
    pub fn resolve(&self, map: &SeverityMap) -> u32 {
        match self {
            Threshold::Rank(rank) => *rank,
            Threshold::Name(name) => map
                .rank(name)
                .or_else(|| name.parse::<u32>().ok())
                .unwrap_or(DEFAULT_ERROR_RANK),
        }
    }
}

impl From<&str> for Threshold {
    fn from(name: &str) -> Self {
        Threshold::Name(name.to_string())
    }
}

impl From<u32> for Threshold {
    fn from(rank: u32) -> Self {
        Threshold::Rank(rank)
    }
}
