//! Mutual availability between vendors and buyers.
//!
//! Availability is date-granular: a slot is shared when its date is in
//! both parties' `available_dates`.

use std::collections::{HashMap, HashSet};

use crate::models::{Buyer, TimeSlot, Vendor};

/// Slots both parties can attend, in input order.
pub fn calculate_overlap(vendor: &Vendor, buyer: &Buyer, slots: &[TimeSlot]) -> Vec<TimeSlot> {
    let vendor_dates: HashSet<&str> = vendor.available_dates.iter().map(String::as_str).collect();
    let buyer_dates: HashSet<&str> = buyer.available_dates.iter().map(String::as_str).collect();

    slots
        .iter()
        .filter(|s| vendor_dates.contains(s.date.as_str()) && buyer_dates.contains(s.date.as_str()))
        .cloned()
        .collect()
}

/// Precomputed shared slots for every vendor-buyer pair.
///
/// Addressed by vendor ID then buyer ID; [`pair_key`] renders the
/// `"vendorId-buyerId"` label of a pair. Built once per run and read-only
/// after.
#[derive(Debug, Clone, Default)]
pub struct OverlapMatrix {
    pairs: HashMap<String, HashMap<String, Vec<TimeSlot>>>,
}

impl OverlapMatrix {
    /// Computes the overlap of all vendor × buyer pairs.
    pub fn build(vendors: &[Vendor], buyers: &[Buyer], slots: &[TimeSlot]) -> Self {
        let pairs = vendors
            .iter()
            .map(|vendor| {
                let row = buyers
                    .iter()
                    .map(|buyer| (buyer.id.clone(), calculate_overlap(vendor, buyer, slots)))
                    .collect();
                (vendor.id.clone(), row)
            })
            .collect();
        Self { pairs }
    }

    /// Shared slots of a pair (empty when unknown).
    pub fn get(&self, vendor_id: &str, buyer_id: &str) -> &[TimeSlot] {
        self.pairs
            .get(vendor_id)
            .and_then(|row| row.get(buyer_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of shared slots of a pair.
    pub fn overlap_count(&self, vendor_id: &str, buyer_id: &str) -> usize {
        self.get(vendor_id, buyer_id).len()
    }

    /// Number of pairs in the matrix.
    pub fn len(&self) -> usize {
        self.pairs.values().map(|row| row.len()).sum()
    }

    /// Whether the matrix holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of shared slots across all pairs.
    pub fn total_overlap(&self) -> usize {
        self.pairs
            .values()
            .flat_map(|row| row.values())
            .map(|slots| slots.len())
            .sum()
    }
}

/// Matrix key of a pair.
pub fn pair_key(vendor_id: &str, buyer_id: &str) -> String {
    format!("{vendor_id}-{buyer_id}")
}
