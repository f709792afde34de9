//! Stability verification.
//!
//! # Definition
//!
//! An unmatched vendor-buyer pair with at least one shared slot is
//! **blocking** when all three hold:
//!
//! - the vendor strictly prefers the buyer over its worst current partner;
//! - the buyer strictly prefers the vendor over its worst current partner;
//! - some shared slot is free for both.
//!
//! A party without any meeting prefers every ranked partner. Spare
//! capacity alone does not make a party willing: a vendor holding only
//! partners it ranks higher is not blocked by a lower-ranked buyer.
//!
//! The check is read-only and idempotent.
//!
//! # Reference
//! Roth & Sotomayor (1990), "Two-Sided Matching", Ch. 5 (many-to-many)

use super::context::MatchContext;
use super::state::Ledger;
use crate::models::{BlockingPair, Meeting, StabilityReport};

/// Checks a set of meetings for blocking pairs.
///
/// # Complexity
/// O(V·B·(S + M)) for S shared slots and M meetings per party.
pub fn verify_stability(meetings: &[Meeting], ctx: &MatchContext<'_>) -> StabilityReport {
    let ledger = Ledger::from_meetings(ctx, meetings);
    let mut blocking_pairs = Vec::new();
    let mut total_pairs_checked = 0;

    for (v, vendor) in ctx.vendors.iter().enumerate() {
        for (b, buyer) in ctx.buyers.iter().enumerate() {
            if ctx.shared_slots(v, b).is_empty() || ledger.is_matched(v, &buyer.id) {
                continue;
            }
            total_pairs_checked += 1;

            let vendor_worst = ledger.worst_vendor_match(ctx, v);
            let buyer_worst = ledger.worst_buyer_match(ctx, b);

            let vendor_reason = match vendor_worst {
                None => Some(format!("{} has no meetings", vendor.id)),
                Some(w) => prefers(ctx.vendor_rank(v, b), rank_of_buyer(ctx, v, w))
                    .then(|| format!("{} prefers {} over {}", vendor.id, buyer.id, w.buyer_id)),
            };
            let Some(vendor_reason) = vendor_reason else {
                continue;
            };

            let buyer_reason = match buyer_worst {
                None => Some(format!("{} has no meetings", buyer.id)),
                Some(w) => prefers(ctx.buyer_rank(b, v), rank_of_vendor(ctx, b, w))
                    .then(|| format!("{} prefers {} over {}", buyer.id, vendor.id, w.vendor_id)),
            };
            let Some(buyer_reason) = buyer_reason else {
                continue;
            };

            let Some(slot) = ledger.free_slots(ctx, v, b).into_iter().next() else {
                continue;
            };

            tracing::debug!(vendor = %vendor.id, buyer = %buyer.id, "blocking pair");
            blocking_pairs.push(BlockingPair {
                vendor_id: vendor.id.clone(),
                buyer_id: buyer.id.clone(),
                reason: format!("{vendor_reason}; {buyer_reason}; both free at {}", slot.datetime),
                vendor_current_match: vendor_worst.cloned(),
                buyer_current_match: buyer_worst.cloned(),
            });
        }
    }

    StabilityReport {
        is_stable: blocking_pairs.is_empty(),
        blocking_pairs,
        total_pairs_checked,
    }
}

/// Strict preference: `candidate` ranked better than `current`.
fn prefers(candidate: Option<usize>, current: Option<usize>) -> bool {
    match (candidate, current) {
        (Some(c), Some(w)) => c < w,
        (Some(_), None) => true,
        _ => false,
    }
}

fn rank_of_buyer(ctx: &MatchContext<'_>, vendor: usize, m: &Meeting) -> Option<usize> {
    ctx.buyer_index(&m.buyer_id)
        .and_then(|b| ctx.vendor_rank(vendor, b))
}

fn rank_of_vendor(ctx: &MatchContext<'_>, buyer: usize, m: &Meeting) -> Option<usize> {
    ctx.vendor_index(&m.vendor_id)
        .and_then(|v| ctx.buyer_rank(buyer, v))
}
