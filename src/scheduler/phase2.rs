//! Phase 2: capacity fill.
//!
//! # Algorithm
//!
//! Runs after Phase 1 succeeded. Roles swap: buyers propose, vendors
//! review.
//!
//! 1. **Propose** (buyer input order): each buyer with capacity left
//!    proposes to its highest-ranked vendor that it has not met, that is
//!    below `max_meetings_per_vendor`, that has not declined it in this
//!    phase, and that shares a slot free for both.
//! 2. **Review** (vendor input order): each vendor ranks the offers by its
//!    own preferences (same discipline as Phase 1) and accepts up to its
//!    headroom. Declines are permanent for the pair.
//! 3. **Settle**: a round without proposals ends the phase.
//!
//! Phase 1 meetings are never revisited. The phase cannot fail; hitting
//! `max_iterations` only stops it early.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::context::MatchContext;
use super::negotiation::{allocate, Offer};
use super::state::Ledger;
use super::trace::{TraceDetails, TraceEventKind, TraceSink};
use crate::models::{Meeting, MeetingPhase};

/// Outcome of Phase 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase2Result {
    /// Always `true`; the phase has no failure mode.
    pub success: bool,
    /// All meetings after the phase (Phase 1 meetings included).
    pub assignments: Vec<Meeting>,
    /// Meetings per vendor.
    pub vendor_meeting_counts: BTreeMap<String, usize>,
    /// Booked buyer slots.
    pub filled_buyer_slots: usize,
    /// Sum of buyer capacities.
    pub total_buyer_slots: usize,
    /// `total_buyer_slots - filled_buyer_slots`.
    pub unfilled_slots: usize,
    /// Meetings added in this phase.
    pub added_meetings: usize,
    /// Rounds started.
    pub rounds: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Begin,
    Propose(usize),
    Review(usize),
    Settle,
}

/// Stepwise Phase 2 engine.
#[derive(Debug, Clone)]
pub(crate) struct Phase2 {
    cursor: Cursor,
    finished: bool,
    round: usize,
    proposals: usize,
    inbox: Vec<Vec<Offer>>,
    declined: HashSet<(usize, usize)>,
}

impl Phase2 {
    pub(crate) fn new(vendor_count: usize) -> Self {
        Self {
            cursor: Cursor::Begin,
            finished: false,
            round: 0,
            proposals: 0,
            inbox: vec![Vec::new(); vendor_count],
            declined: HashSet::new(),
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    /// Applies one transition: a round start, one buyer's proposal, one
    /// vendor's review, or the round settlement.
    pub(crate) fn step(&mut self, ctx: &MatchContext<'_>, ledger: &mut Ledger, sink: &mut TraceSink) {
        if self.finished {
            return;
        }

        match self.cursor {
            Cursor::Begin => self.begin(ctx, ledger, sink),
            Cursor::Propose(b) if b < ctx.buyers.len() => {
                self.propose(ctx, ledger, sink, b);
                self.cursor = Cursor::Propose(b + 1);
            }
            Cursor::Propose(_) => self.cursor = Cursor::Review(0),
            Cursor::Review(v) if v < ctx.vendors.len() => {
                self.review(ctx, ledger, sink, v);
                self.cursor = Cursor::Review(v + 1);
            }
            Cursor::Review(_) => self.cursor = Cursor::Settle,
            Cursor::Settle => self.settle(ctx, ledger, sink),
        }
    }

    /// Summarizes the phase so far.
    pub(crate) fn result(&self, ctx: &MatchContext<'_>, ledger: &Ledger) -> Phase2Result {
        let total_buyer_slots = ctx.total_buyer_capacity();
        let filled_buyer_slots = ledger.meetings().len();
        Phase2Result {
            success: true,
            assignments: ledger.meetings().to_vec(),
            vendor_meeting_counts: ctx
                .vendors
                .iter()
                .enumerate()
                .map(|(i, v)| (v.id.clone(), ledger.meetings_count(i)))
                .collect(),
            filled_buyer_slots,
            total_buyer_slots,
            unfilled_slots: total_buyer_slots.saturating_sub(filled_buyer_slots),
            added_meetings: ledger
                .meetings()
                .iter()
                .filter(|m| m.phase == MeetingPhase::CapacityFill)
                .count(),
            rounds: self.round,
        }
    }

    fn begin(&mut self, ctx: &MatchContext<'_>, ledger: &Ledger, sink: &mut TraceSink) {
        if self.round >= ctx.config.max_iterations {
            tracing::info!(rounds = self.round, "phase 2 stopped at iteration limit");
            sink.emit(
                TraceEventKind::Info,
                format!("Phase 2 stopped after {} rounds (iteration limit)", self.round),
            );
            self.finish(ctx, ledger, sink);
            return;
        }

        self.round += 1;
        self.proposals = 0;
        sink.emit(
            TraceEventKind::IterationStart,
            format!("Round {:03}", self.round),
        );
        self.cursor = Cursor::Propose(0);
    }

    fn propose(&mut self, ctx: &MatchContext<'_>, ledger: &Ledger, sink: &mut TraceSink, b: usize) {
        if ledger.remaining_capacity(b) == 0 {
            return;
        }
        let buyer_id = &ctx.buyers[b].id;
        let max = ctx.max_meetings();

        let choice = ctx.preferences.for_buyer(buyer_id).iter().find_map(|pref| {
            let v = ctx.vendor_index(&pref.vendor_id)?;
            if ledger.is_matched(v, buyer_id)
                || ledger.meetings_count(v) >= max
                || self.declined.contains(&(v, b))
            {
                return None;
            }
            let slots = ledger.free_slots(ctx, v, b);
            (!slots.is_empty()).then_some((v, pref, slots))
        });

        let Some((v, pref, slots)) = choice else {
            return;
        };

        let rank = ctx.vendor_rank(v, b).unwrap_or(usize::MAX);
        let flexibility = slots.len();
        let arrival = self.proposals;
        tracing::debug!(buyer = %buyer_id, vendor = %pref.vendor_id, slots = flexibility, "fill proposal");
        sink.emit_with(
            TraceEventKind::Proposal,
            format!("{} --> {}", buyer_id, pref.vendor_id),
            TraceDetails::pair(&pref.vendor_id, buyer_id)
                .with_score(pref.score, pref.tier)
                .with_slots(flexibility),
        );

        self.inbox[v].extend(slots.into_iter().map(|slot| Offer {
            proposer: b,
            slot,
            rank,
            score: pref.score,
            tier: pref.tier,
            flexibility,
            arrival,
        }));
        self.proposals += 1;
    }

    fn review(&mut self, ctx: &MatchContext<'_>, ledger: &mut Ledger, sink: &mut TraceSink, v: usize) {
        let offers = std::mem::take(&mut self.inbox[v]);
        if offers.is_empty() {
            return;
        }
        let vendor_id = &ctx.vendors[v].id;

        let count = offers
            .iter()
            .map(|o| o.proposer)
            .collect::<HashSet<_>>()
            .len();
        tracing::debug!(vendor = %vendor_id, proposals = count, "vendor review");
        sink.emit_with(
            TraceEventKind::BuyerReview,
            format!(
                "{vendor_id} evaluating {count} proposal{}",
                if count == 1 { "" } else { "s" }
            ),
            TraceDetails::vendor(vendor_id),
        );

        let headroom = ctx.max_meetings().saturating_sub(ledger.meetings_count(v));
        let allocation = allocate(offers, headroom, |o| ledger.can_book(v, o.proposer, &o.slot));

        for offer in &allocation.accepted {
            let meeting = ledger.book(
                ctx,
                v,
                offer.proposer,
                offer.slot.clone(),
                offer.score,
                offer.tier,
                MeetingPhase::CapacityFill,
            );
            sink.emit_with(
                TraceEventKind::Acceptance,
                format!("{} <<< {}", meeting.vendor_id, meeting.buyer_id),
                TraceDetails::pair(&meeting.vendor_id, &meeting.buyer_id)
                    .with_score(meeting.score, meeting.tier)
                    .with_time_slot(&meeting.time_slot),
            );
        }

        for &b in &allocation.rejected {
            self.declined.insert((v, b));
            let buyer_id = &ctx.buyers[b].id;
            let reason = if allocation.capacity_exhausted {
                "vendor at maximum"
            } else {
                "offered slots taken"
            };
            sink.emit_with(
                TraceEventKind::Rejection,
                format!("{vendor_id} xxx {buyer_id}"),
                TraceDetails::pair(vendor_id, buyer_id).with_reason(reason),
            );
        }
    }

    fn settle(&mut self, ctx: &MatchContext<'_>, ledger: &Ledger, sink: &mut TraceSink) {
        sink.emit(
            TraceEventKind::StatusSnapshot,
            format!(
                "Buyer slots filled: {}/{}",
                ledger.meetings().len(),
                ctx.total_buyer_capacity()
            ),
        );

        if self.proposals == 0 {
            self.finish(ctx, ledger, sink);
        } else {
            self.cursor = Cursor::Begin;
        }
    }

    fn finish(&mut self, ctx: &MatchContext<'_>, ledger: &Ledger, sink: &mut TraceSink) {
        self.finished = true;
        let result = self.result(ctx, ledger);
        tracing::info!(
            rounds = result.rounds,
            added = result.added_meetings,
            unfilled = result.unfilled_slots,
            "phase 2 complete"
        );
        sink.emit(TraceEventKind::Success, "PHASE 2 COMPLETE");
        sink.emit(
            TraceEventKind::Info,
            format!(
                "{} meetings added | {}/{} buyer slots filled",
                result.added_meetings, result.filled_buyer_slots, result.total_buyer_slots
            ),
        );
    }
}
