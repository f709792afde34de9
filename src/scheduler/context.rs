//! Read-only data shared by every phase of a run.

use std::collections::HashMap;

use crate::matching::{OverlapMatrix, PreferenceTable};
use crate::models::{filter_slots_by_dates, Buyer, SchedulerConfig, TimeSlot, Vendor};

/// Precomputed, immutable inputs of one scheduling run.
///
/// Borrows the participant lists and configuration; owns the generated
/// slots, the overlap matrix, and the preference table. Entities are
/// addressed by their input position; the ID maps translate.
#[derive(Debug, Clone)]
pub struct MatchContext<'a> {
    /// Vendors, in input order.
    pub vendors: &'a [Vendor],
    /// Buyers, in input order.
    pub buyers: &'a [Buyer],
    /// Event configuration.
    pub config: &'a SchedulerConfig,
    /// Bookable slots of the event.
    pub time_slots: Vec<TimeSlot>,
    /// Shared slots per pair.
    pub overlap: OverlapMatrix,
    /// Ranked preference lists.
    pub preferences: PreferenceTable,
    vendor_index: HashMap<&'a str, usize>,
    buyer_index: HashMap<&'a str, usize>,
    buyer_capacities: Vec<usize>,
}

impl<'a> MatchContext<'a> {
    /// Builds overlap, preferences, and buyer capacities.
    ///
    /// A buyer's capacity is the number of slots falling on its available
    /// dates.
    pub fn new(
        vendors: &'a [Vendor],
        buyers: &'a [Buyer],
        config: &'a SchedulerConfig,
        time_slots: Vec<TimeSlot>,
    ) -> Self {
        let overlap = OverlapMatrix::build(vendors, buyers, &time_slots);
        let preferences = PreferenceTable::build(vendors, buyers, &overlap);

        let vendor_index = vendors
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id.as_str(), i))
            .collect();
        let buyer_index = buyers
            .iter()
            .enumerate()
            .map(|(j, b)| (b.id.as_str(), j))
            .collect();
        let buyer_capacities = buyers
            .iter()
            .map(|b| filter_slots_by_dates(&time_slots, &b.available_dates).count())
            .collect();

        Self {
            vendors,
            buyers,
            config,
            time_slots,
            overlap,
            preferences,
            vendor_index,
            buyer_index,
            buyer_capacities,
        }
    }

    /// Input position of a vendor.
    pub fn vendor_index(&self, vendor_id: &str) -> Option<usize> {
        self.vendor_index.get(vendor_id).copied()
    }

    /// Input position of a buyer.
    pub fn buyer_index(&self, buyer_id: &str) -> Option<usize> {
        self.buyer_index.get(buyer_id).copied()
    }

    /// Capacity of the buyer at `index` (0 when out of range).
    pub fn buyer_capacity(&self, index: usize) -> usize {
        self.buyer_capacities.get(index).copied().unwrap_or(0)
    }

    /// Sum of all buyer capacities.
    pub fn total_buyer_capacity(&self) -> usize {
        self.buyer_capacities.iter().sum()
    }

    /// Meetings every vendor must reach in Phase 1.
    pub fn min_meetings(&self) -> usize {
        self.config.min_meetings_per_vendor
    }

    /// Meetings no vendor may exceed.
    pub fn max_meetings(&self) -> usize {
        self.config.max_meetings_per_vendor
    }

    /// Shared slots of the pair at the given positions.
    pub fn shared_slots(&self, vendor: usize, buyer: usize) -> &[TimeSlot] {
        match (self.vendors.get(vendor), self.buyers.get(buyer)) {
            (Some(v), Some(b)) => self.overlap.get(&v.id, &b.id),
            _ => &[],
        }
    }

    /// The buyer's rank of a vendor (0 = favorite), by position.
    pub fn buyer_rank(&self, buyer: usize, vendor: usize) -> Option<usize> {
        let b = self.buyers.get(buyer)?;
        let v = self.vendors.get(vendor)?;
        self.preferences.buyer_rank(&b.id, &v.id)
    }

    /// The vendor's rank of a buyer (0 = favorite), by position.
    pub fn vendor_rank(&self, vendor: usize, buyer: usize) -> Option<usize> {
        let v = self.vendors.get(vendor)?;
        let b = self.buyers.get(buyer)?;
        self.preferences.vendor_rank(&v.id, &b.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailySchedule;

    #[test]
    fn test_capacity_counts_slots_on_buyer_dates() {
        let config = SchedulerConfig::new("2025-01-15", "2025-01-16")
            .with_daily_schedule(DailySchedule::new("2025-01-15").with_window("09:00", "11:00"))
            .with_daily_schedule(DailySchedule::new("2025-01-16").with_window("09:00", "10:00"));
        let vendors = vec![Vendor::new("V1").with_available_date("2025-01-16")];
        let buyers = vec![
            Buyer::new("B1")
                .with_available_date("2025-01-15")
                .with_available_date("2025-01-16"),
            Buyer::new("B2").with_available_date("2025-01-16"),
            Buyer::new("B3"),
        ];
        let slots = config.time_slots().unwrap();
        let ctx = MatchContext::new(&vendors, &buyers, &config, slots);

        assert_eq!(ctx.buyer_capacity(0), 6);
        assert_eq!(ctx.buyer_capacity(1), 2);
        assert_eq!(ctx.buyer_capacity(2), 0);
        assert_eq!(ctx.buyer_capacity(9), 0);
        assert_eq!(ctx.total_buyer_capacity(), 8);
        assert_eq!(ctx.buyer_index("B2"), Some(1));
        assert_eq!(ctx.vendor_index("V2"), None);
        assert_eq!(ctx.shared_slots(0, 0).len(), 2);
        assert_eq!(ctx.vendor_rank(0, 2), None);
    }
}
