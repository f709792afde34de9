//! Review discipline shared by both phases.
//!
//! A reviewer (the buyer in Phase 1, the vendor in Phase 2) receives
//! single-slot offers and accepts them greedily in ranking order.
//!
//! # Ranking
//! 1. Reviewer's preference rank of the proposer (favorite first)
//! 2. Pair score, descending
//! 3. Proposer flexibility (slots offered), descending
//! 4. Arrival order
//! 5. Slot, chronological
//!
//! # Acceptance
//! Walking the ranked offers, an offer is taken when its proposer has no
//! accepted offer yet, its slot is not yet taken in this review, the slot
//! is still free in the ledger, and the reviewer has capacity left.
//! Proposers left without an accepted offer are rejected.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{Tier, TimeSlot};

/// One single-slot offer under review.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Offer {
    /// Input position of the proposer.
    pub proposer: usize,
    /// Offered slot.
    pub slot: TimeSlot,
    /// Reviewer's rank of the proposer.
    pub rank: usize,
    /// Pair score.
    pub score: f64,
    /// Pair tier.
    pub tier: Tier,
    /// Slots the proposer offered in total.
    pub flexibility: usize,
    /// Arrival position of the proposal.
    pub arrival: usize,
}

/// Outcome of one review.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Allocation {
    /// Accepted offers, in ranking order.
    pub accepted: Vec<Offer>,
    /// Rejected proposers, in ranking order of their best offer.
    pub rejected: Vec<usize>,
    /// Whether the reviewer ran out of capacity.
    pub capacity_exhausted: bool,
}

/// Orders offers by the review ranking.
pub(crate) fn compare_offers(a: &Offer, b: &Offer) -> Ordering {
    a.rank
        .cmp(&b.rank)
        .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
        .then_with(|| b.flexibility.cmp(&a.flexibility))
        .then_with(|| a.arrival.cmp(&b.arrival))
        .then_with(|| a.slot.cmp(&b.slot))
}

/// Greedily accepts offers up to `capacity`.
///
/// `is_free` reports whether the ledger still allows an offer.
pub(crate) fn allocate<F>(mut offers: Vec<Offer>, capacity: usize, is_free: F) -> Allocation
where
    F: Fn(&Offer) -> bool,
{
    offers.sort_by(compare_offers);

    let mut accepted: Vec<Offer> = Vec::new();
    let mut served: HashSet<usize> = HashSet::new();
    let mut taken: HashSet<TimeSlot> = HashSet::new();
    let mut seen: Vec<usize> = Vec::new();

    for offer in offers {
        if !seen.contains(&offer.proposer) {
            seen.push(offer.proposer);
        }
        if accepted.len() >= capacity
            || served.contains(&offer.proposer)
            || taken.contains(&offer.slot)
            || !is_free(&offer)
        {
            continue;
        }
        served.insert(offer.proposer);
        taken.insert(offer.slot.clone());
        accepted.push(offer);
    }

    let capacity_exhausted = accepted.len() >= capacity;
    let rejected = seen.into_iter().filter(|p| !served.contains(p)).collect();

    Allocation {
        accepted,
        rejected,
        capacity_exhausted,
    }
}
