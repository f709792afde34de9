//! Ranked preference lists for both sides.
//!
//! Every mutually available pair is scored once; the score is shared by both
//! sides, so a vendor's ranking of buyers and a buyer's ranking of vendors
//! are built from the same numbers. Pairs without a shared slot are left
//! out entirely.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{calculate_match_score, OverlapMatrix};
use crate::models::{Buyer, Tier, TimeSlot, Vendor};

/// One entry of a vendor's ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorPreference {
    /// Ranked buyer.
    pub buyer_id: String,
    /// Pair score.
    pub score: f64,
    /// Pair tier.
    pub tier: Tier,
    /// Slots both can attend.
    pub available_slots: Vec<TimeSlot>,
}

/// One entry of a buyer's ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyerPreference {
    /// Ranked vendor.
    pub vendor_id: String,
    /// Pair score.
    pub score: f64,
    /// Pair tier.
    pub tier: Tier,
    /// Slots both can attend.
    pub available_slots: Vec<TimeSlot>,
}

/// Preference lists of all vendors and buyers.
///
/// Lists are sorted by score, descending; ties keep input order. Every
/// vendor and buyer has a (possibly empty) list.
#[derive(Debug, Clone, Default)]
pub struct PreferenceTable {
    vendor_preferences: HashMap<String, Vec<VendorPreference>>,
    buyer_preferences: HashMap<String, Vec<BuyerPreference>>,
    vendor_ranks: HashMap<String, HashMap<String, usize>>,
    buyer_ranks: HashMap<String, HashMap<String, usize>>,
}

impl PreferenceTable {
    /// Scores every overlapping pair and ranks both sides.
    ///
    /// # Complexity
    /// O(V·B) scoring plus O(V·B·log B + B·V·log V) sorting.
    pub fn build(vendors: &[Vendor], buyers: &[Buyer], overlap: &OverlapMatrix) -> Self {
        let mut vendor_preferences: HashMap<String, Vec<VendorPreference>> =
            vendors.iter().map(|v| (v.id.clone(), Vec::new())).collect();
        let mut buyer_preferences: HashMap<String, Vec<BuyerPreference>> =
            buyers.iter().map(|b| (b.id.clone(), Vec::new())).collect();

        for vendor in vendors {
            for buyer in buyers {
                let shared = overlap.get(&vendor.id, &buyer.id);
                if shared.is_empty() {
                    continue;
                }

                let m = calculate_match_score(vendor, buyer);

                if let Some(list) = vendor_preferences.get_mut(&vendor.id) {
                    list.push(VendorPreference {
                        buyer_id: buyer.id.clone(),
                        score: m.score,
                        tier: m.tier,
                        available_slots: shared.to_vec(),
                    });
                }
                if let Some(list) = buyer_preferences.get_mut(&buyer.id) {
                    list.push(BuyerPreference {
                        vendor_id: vendor.id.clone(),
                        score: m.score,
                        tier: m.tier,
                        available_slots: shared.to_vec(),
                    });
                }
            }
        }

        for list in vendor_preferences.values_mut() {
            list.sort_by(|a, b| by_score_desc(a.score, b.score));
        }
        for list in buyer_preferences.values_mut() {
            list.sort_by(|a, b| by_score_desc(a.score, b.score));
        }

        let vendor_ranks = vendor_preferences
            .iter()
            .map(|(id, list)| {
                let ranks = list
                    .iter()
                    .enumerate()
                    .map(|(rank, p)| (p.buyer_id.clone(), rank))
                    .collect();
                (id.clone(), ranks)
            })
            .collect();
        let buyer_ranks = buyer_preferences
            .iter()
            .map(|(id, list)| {
                let ranks = list
                    .iter()
                    .enumerate()
                    .map(|(rank, p)| (p.vendor_id.clone(), rank))
                    .collect();
                (id.clone(), ranks)
            })
            .collect();

        Self {
            vendor_preferences,
            buyer_preferences,
            vendor_ranks,
            buyer_ranks,
        }
    }

    /// Ranked buyers of a vendor (empty when unknown).
    pub fn for_vendor(&self, vendor_id: &str) -> &[VendorPreference] {
        self.vendor_preferences
            .get(vendor_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ranked vendors of a buyer (empty when unknown).
    pub fn for_buyer(&self, buyer_id: &str) -> &[BuyerPreference] {
        self.buyer_preferences
            .get(buyer_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Position of `buyer_id` in the vendor's list (0 = favorite).
    pub fn vendor_rank(&self, vendor_id: &str, buyer_id: &str) -> Option<usize> {
        self.vendor_ranks
            .get(vendor_id)
            .and_then(|ranks| ranks.get(buyer_id))
            .copied()
    }

    /// Position of `vendor_id` in the buyer's list (0 = favorite).
    pub fn buyer_rank(&self, buyer_id: &str, vendor_id: &str) -> Option<usize> {
        self.buyer_ranks
            .get(buyer_id)
            .and_then(|ranks| ranks.get(vendor_id))
            .copied()
    }

    /// Number of mutually available (ranked) pairs.
    pub fn feasible_pairs(&self) -> usize {
        self.vendor_preferences.values().map(Vec::len).sum()
    }
}

fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
