//! Compatibility scoring, mutual availability, and preference ranking.
//!
//! Everything in this module is pure and deterministic: the same vendors,
//! buyers, and slots always produce bit-identical scores and identical
//! preference lists.
//!
//! # Pipeline
//!
//! 1. [`calculate_match_score`] scores one vendor-buyer pair.
//! 2. [`OverlapMatrix`] records the slots each pair can share.
//! 3. [`PreferenceTable`] ranks, per vendor and per buyer, every pair with
//!    at least one shared slot.
//!
//! # Reference
//! Gale & Shapley (1962), "College Admissions and the Stability of Marriage"

mod overlap;
mod preferences;
mod scoring;

pub use overlap::{calculate_overlap, pair_key, OverlapMatrix};
pub use preferences::{BuyerPreference, PreferenceTable, VendorPreference};
pub use scoring::{
    calculate_match_score, combine_scores, determine_tier, normalize_priority, product_affinity,
    PRODUCT_WEIGHT, SECTOR_WEIGHT, SUB_SECTOR_WEIGHT,
};
