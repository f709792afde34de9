//! Mutable negotiation state of one run.
//!
//! The [`Ledger`] owns every per-run record: vendor and buyer states,
//! slot occupancy on both sides, and the confirmed meetings. All of them
//! are indexed by input position. Input records are never touched.
//!
//! # Invariants
//! - `meetings_count == assigned_meetings.len()` per vendor
//! - `matched_buyers` equals the buyers of `assigned_meetings`
//! - `accepted_meetings.len() <= capacity` per buyer
//! - A (vendor, buyer) pair, a (vendor, slot), and a (buyer, slot) are
//!   each booked at most once

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::context::MatchContext;
use crate::models::{Meeting, MeetingPhase, Tier, TimeSlot};

/// Rejection history of a vendor at one buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionInfo {
    /// Phase 1 iteration of the latest rejection.
    pub iteration: usize,
    /// Rejections received from this buyer so far.
    pub times_rejected: u32,
}

/// A confirmed booking seen from one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// The other party.
    pub partner_id: String,
    /// Booked slot.
    pub slot: TimeSlot,
}

/// One slot of a vendor's proposal, as held by the buyer under review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotProposal {
    /// Proposing vendor.
    pub vendor_id: String,
    /// Offered slot.
    pub slot: TimeSlot,
    /// Pair score.
    pub score: f64,
    /// Pair tier.
    pub tier: Tier,
    /// The buyer's rank of the vendor (0 = favorite).
    pub buyer_preference_rank: usize,
    /// Number of slots the vendor offered in this proposal.
    pub flexibility: usize,
}

/// Per-vendor negotiation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorState {
    /// Confirmed meetings.
    pub assigned_meetings: Vec<Booking>,
    /// Number of confirmed meetings.
    pub meetings_count: usize,
    /// Buyers already met.
    pub matched_buyers: HashSet<String>,
    /// Rejection history per buyer.
    pub rejected_proposals: HashMap<String, RejectionInfo>,
}

/// Per-buyer negotiation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyerState {
    /// Slot proposals awaiting review in the current iteration.
    pub current_proposals: Vec<SlotProposal>,
    /// Confirmed meetings.
    pub accepted_meetings: Vec<Booking>,
    /// Slots the buyer can host.
    pub capacity: usize,
}

impl VendorState {
    /// Times this vendor was rejected by `buyer_id`.
    pub fn times_rejected_by(&self, buyer_id: &str) -> u32 {
        self.rejected_proposals
            .get(buyer_id)
            .map(|r| r.times_rejected)
            .unwrap_or(0)
    }

    /// Rejections received across all buyers.
    pub fn total_rejections(&self) -> u32 {
        self.rejected_proposals.values().map(|r| r.times_rejected).sum()
    }
}

impl BuyerState {
    /// Capacity left.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.accepted_meetings.len())
    }
}

/// Owner of all mutable per-run state.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    vendors: Vec<VendorState>,
    buyers: Vec<BuyerState>,
    vendor_busy: Vec<HashSet<TimeSlot>>,
    buyer_busy: Vec<HashMap<TimeSlot, usize>>,
    meetings: Vec<Meeting>,
}

impl Ledger {
    /// Creates an empty ledger sized for the context.
    pub fn new(ctx: &MatchContext<'_>) -> Self {
        Self {
            vendors: vec![VendorState::default(); ctx.vendors.len()],
            buyers: (0..ctx.buyers.len())
                .map(|j| BuyerState {
                    capacity: ctx.buyer_capacity(j),
                    ..BuyerState::default()
                })
                .collect(),
            vendor_busy: vec![HashSet::new(); ctx.vendors.len()],
            buyer_busy: vec![HashMap::new(); ctx.buyers.len()],
            meetings: Vec::new(),
        }
    }

    /// Replays existing meetings into a fresh ledger.
    ///
    /// Meetings naming unknown participants, or colliding with an earlier
    /// booking, are skipped.
    pub fn from_meetings(ctx: &MatchContext<'_>, meetings: &[Meeting]) -> Self {
        let mut ledger = Self::new(ctx);
        for m in meetings {
            let (Some(v), Some(b)) = (ctx.vendor_index(&m.vendor_id), ctx.buyer_index(&m.buyer_id))
            else {
                continue;
            };
            if ledger.can_book(v, b, &m.time_slot) {
                ledger.book(ctx, v, b, m.time_slot.clone(), m.score, m.tier, m.phase);
            }
        }
        ledger
    }

    /// State of the vendor at `index`.
    pub fn vendor(&self, index: usize) -> Option<&VendorState> {
        self.vendors.get(index)
    }

    /// State of the buyer at `index`.
    pub fn buyer(&self, index: usize) -> Option<&BuyerState> {
        self.buyers.get(index)
    }

    /// All vendor states, in input order.
    pub fn vendor_states(&self) -> &[VendorState] {
        &self.vendors
    }

    /// All buyer states, in input order.
    pub fn buyer_states(&self) -> &[BuyerState] {
        &self.buyers
    }

    /// Confirmed meetings, in booking order.
    pub fn meetings(&self) -> &[Meeting] {
        &self.meetings
    }

    /// Meetings of the vendor at `index`.
    pub fn meetings_count(&self, vendor: usize) -> usize {
        self.vendors.get(vendor).map(|s| s.meetings_count).unwrap_or(0)
    }

    /// Capacity left at the buyer at `index`.
    pub fn remaining_capacity(&self, buyer: usize) -> usize {
        self.buyers
            .get(buyer)
            .map(BuyerState::remaining_capacity)
            .unwrap_or(0)
    }

    /// Whether the pair already has a meeting.
    pub fn is_matched(&self, vendor: usize, buyer_id: &str) -> bool {
        self.vendors
            .get(vendor)
            .is_some_and(|s| s.matched_buyers.contains(buyer_id))
    }

    /// Whether neither party is booked at `slot`.
    pub fn slot_free(&self, vendor: usize, buyer: usize, slot: &TimeSlot) -> bool {
        let vendor_free = self.vendor_busy.get(vendor).is_some_and(|s| !s.contains(slot));
        let buyer_free = self
            .buyer_busy
            .get(buyer)
            .is_some_and(|s| !s.contains_key(slot));
        vendor_free && buyer_free
    }

    /// Shared slots of the pair still free for both, in chronological order.
    pub fn free_slots(&self, ctx: &MatchContext<'_>, vendor: usize, buyer: usize) -> Vec<TimeSlot> {
        let mut slots: Vec<TimeSlot> = ctx
            .shared_slots(vendor, buyer)
            .iter()
            .filter(|s| self.slot_free(vendor, buyer, s))
            .cloned()
            .collect();
        slots.sort();
        slots
    }

    /// Vendor booked at the buyer's `slot`, if any.
    pub fn buyer_slot_holder(&self, buyer: usize, slot: &TimeSlot) -> Option<usize> {
        self.buyer_busy.get(buyer).and_then(|s| s.get(slot)).copied()
    }

    /// Whether a booking would keep every invariant.
    pub fn can_book(&self, vendor: usize, buyer: usize, slot: &TimeSlot) -> bool {
        vendor < self.vendors.len()
            && buyer < self.buyers.len()
            && self.remaining_capacity(buyer) > 0
            && self.slot_free(vendor, buyer, slot)
            && !self.buyer_busy[buyer].values().any(|&v| v == vendor)
    }

    /// Records a confirmed meeting on both sides and returns it.
    ///
    /// Callers check [`can_book`](Self::can_book) first.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn book(
        &mut self,
        ctx: &MatchContext<'_>,
        vendor: usize,
        buyer: usize,
        slot: TimeSlot,
        score: f64,
        tier: Tier,
        phase: MeetingPhase,
    ) -> &Meeting {
        let vendor_id = &ctx.vendors[vendor].id;
        let buyer_id = &ctx.buyers[buyer].id;

        let vs = &mut self.vendors[vendor];
        vs.assigned_meetings.push(Booking {
            partner_id: buyer_id.clone(),
            slot: slot.clone(),
        });
        vs.meetings_count = vs.assigned_meetings.len();
        vs.matched_buyers.insert(buyer_id.clone());

        self.buyers[buyer].accepted_meetings.push(Booking {
            partner_id: vendor_id.clone(),
            slot: slot.clone(),
        });

        self.vendor_busy[vendor].insert(slot.clone());
        self.buyer_busy[buyer].insert(slot.clone(), vendor);

        let index = self.meetings.len();
        self.meetings
            .push(Meeting::new(vendor_id, buyer_id, slot, score, tier, phase));
        &self.meetings[index]
    }

    /// Counts a rejection of `vendor` by `buyer_id` in `iteration`.
    pub(crate) fn record_rejection(&mut self, vendor: usize, buyer_id: &str, iteration: usize) {
        if let Some(vs) = self.vendors.get_mut(vendor) {
            let info = vs
                .rejected_proposals
                .entry(buyer_id.to_string())
                .or_insert(RejectionInfo {
                    iteration,
                    times_rejected: 0,
                });
            info.iteration = iteration;
            info.times_rejected += 1;
        }
    }

    /// Queues a slot proposal at the buyer at `index`.
    pub(crate) fn push_proposal(&mut self, buyer: usize, proposal: SlotProposal) {
        if let Some(bs) = self.buyers.get_mut(buyer) {
            bs.current_proposals.push(proposal);
        }
    }

    /// Removes and returns the buyer's pending proposals.
    pub(crate) fn take_proposals(&mut self, buyer: usize) -> Vec<SlotProposal> {
        self.buyers
            .get_mut(buyer)
            .map(|bs| std::mem::take(&mut bs.current_proposals))
            .unwrap_or_default()
    }

    /// Whether the buyer at `index` holds pending proposals.
    pub fn has_proposals(&self, buyer: usize) -> bool {
        self.buyers
            .get(buyer)
            .is_some_and(|bs| !bs.current_proposals.is_empty())
    }

    /// The vendor's lowest-ranked current partner, by its own preferences.
    pub fn worst_vendor_match(&self, ctx: &MatchContext<'_>, vendor: usize) -> Option<&Meeting> {
        self.meetings
            .iter()
            .filter(|m| m.vendor_id == ctx.vendors[vendor].id)
            .max_by_key(|m| {
                ctx.buyer_index(&m.buyer_id)
                    .and_then(|b| ctx.vendor_rank(vendor, b))
                    .unwrap_or(usize::MAX)
            })
    }

    /// The buyer's lowest-ranked current partner, by its own preferences.
    pub fn worst_buyer_match(&self, ctx: &MatchContext<'_>, buyer: usize) -> Option<&Meeting> {
        self.meetings
            .iter()
            .filter(|m| m.buyer_id == ctx.buyers[buyer].id)
            .max_by_key(|m| {
                ctx.vendor_index(&m.vendor_id)
                    .and_then(|v| ctx.buyer_rank(buyer, v))
                    .unwrap_or(usize::MAX)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Buyer, DailySchedule, SchedulerConfig, Vendor};

    fn setup() -> (Vec<Vendor>, Vec<Buyer>, SchedulerConfig) {
        let config = SchedulerConfig::new("2025-01-15", "2025-01-15")
            .with_daily_schedule(DailySchedule::new("2025-01-15").with_window("09:00", "10:00"));
        let vendors = vec![
            Vendor::new("V1").with_available_date("2025-01-15"),
            Vendor::new("V2").with_available_date("2025-01-15"),
        ];
        let buyers = vec![
            Buyer::new("B1").with_available_date("2025-01-15"),
            Buyer::new("B2").with_available_date("2025-01-15"),
        ];
        (vendors, buyers, config)
    }

    #[test]
    fn test_book_updates_both_sides() {
        let (vendors, buyers, config) = setup();
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let mut ledger = Ledger::new(&ctx);
        let slot = ctx.time_slots[0].clone();

        assert!(ledger.can_book(0, 0, &slot));
        let m = ledger.book(&ctx, 0, 0, slot.clone(), 0.5, Tier::Tier2, MeetingPhase::VendorMinimum);
        assert_eq!(m.room_id, "room-B1");

        let vs = ledger.vendor(0).unwrap();
        assert_eq!(vs.meetings_count, 1);
        assert_eq!(vs.assigned_meetings.len(), 1);
        assert!(vs.matched_buyers.contains("B1"));
        assert!(ledger.is_matched(0, "B1"));
        assert_eq!(ledger.remaining_capacity(0), 1);
        assert_eq!(ledger.buyer_slot_holder(0, &slot), Some(0));

        // V1 is busy at 09:00 everywhere; B1 is busy at 09:00 for everyone.
        assert!(!ledger.slot_free(0, 1, &slot));
        assert!(!ledger.slot_free(1, 0, &slot));
        assert!(ledger.slot_free(1, 1, &slot));
        assert_eq!(ledger.free_slots(&ctx, 0, 1).len(), 1);
    }

    #[test]
    fn test_rejection_history() {
        let (vendors, buyers, config) = setup();
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let mut ledger = Ledger::new(&ctx);

        ledger.record_rejection(1, "B1", 1);
        ledger.record_rejection(1, "B1", 3);
        ledger.record_rejection(1, "B2", 3);

        let vs = ledger.vendor(1).unwrap();
        assert_eq!(vs.times_rejected_by("B1"), 2);
        assert_eq!(vs.rejected_proposals["B1"].iteration, 3);
        assert_eq!(vs.total_rejections(), 3);
        assert_eq!(vs.times_rejected_by("B9"), 0);
    }

    #[test]
    fn test_from_meetings_skips_collisions() {
        let (vendors, buyers, config) = setup();
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let slot = ctx.time_slots[0].clone();
        let meetings = vec![
            Meeting::new("V1", "B1", slot.clone(), 0.5, Tier::Tier2, MeetingPhase::VendorMinimum),
            Meeting::new("V2", "B1", slot.clone(), 0.5, Tier::Tier2, MeetingPhase::VendorMinimum),
            Meeting::new("V9", "B1", slot, 0.5, Tier::Tier2, MeetingPhase::VendorMinimum),
        ];
        let ledger = Ledger::from_meetings(&ctx, &meetings);
        assert_eq!(ledger.meetings().len(), 1);
        assert_eq!(ledger.meetings_count(1), 0);
    }

    #[test]
    fn test_proposal_queue() {
        let (vendors, buyers, config) = setup();
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let mut ledger = Ledger::new(&ctx);

        ledger.push_proposal(
            0,
            SlotProposal {
                vendor_id: "V1".into(),
                slot: ctx.time_slots[0].clone(),
                score: 0.3,
                tier: Tier::Tier3,
                buyer_preference_rank: 0,
                flexibility: 2,
            },
        );
        assert!(ledger.has_proposals(0));
        assert_eq!(ledger.take_proposals(0).len(), 1);
        assert!(!ledger.has_proposals(0));
    }
}
