//! Compatibility score model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse match-quality bucket.
///
/// `Tier1` is best. Ordered so that `Tier1 < Tier2 < Tier3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Sector and sub-sector match.
    #[serde(rename = "tier-1")]
    Tier1,
    /// Sector match only.
    #[serde(rename = "tier-2")]
    Tier2,
    /// No sector match (product affinity only).
    #[serde(rename = "tier-3")]
    Tier3,
}

impl Tier {
    /// Wire label (`tier-1`, `tier-2`, `tier-3`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Tier1 => "tier-1",
            Tier::Tier2 => "tier-2",
            Tier::Tier3 => "tier-3",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component scores behind a [`MatchScore`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Normalized sector priority of the best sector.
    pub sector_match: f64,
    /// Combined sub-sector score of the best sector.
    pub sub_sector_match: f64,
    /// Product affinity term.
    pub product_match: f64,
}

/// Compatibility of one vendor-buyer pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Overall score in `[0, 1]`, rounded to 3 decimals.
    pub score: f64,
    /// Tier of the best-scoring sector.
    pub tier: Tier,
    /// Components of the best-scoring sector.
    pub breakdown: ScoreBreakdown,
    /// Best-scoring sector, if any sector matched.
    pub matched_sector: Option<String>,
    /// Best sub-sector within `matched_sector`, if any.
    pub matched_sub_sector: Option<String>,
}
