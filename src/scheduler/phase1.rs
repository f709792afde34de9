//! Phase 1: vendor-minimum deferred acceptance.
//!
//! # Algorithm
//!
//! Repeated rounds until every vendor holds `min_meetings_per_vendor`
//! meetings:
//!
//! 1. **Propose** (vendor input order): each vendor below its minimum
//!    proposes to its highest-ranked eligible buyer, offering every shared
//!    slot still free for both.
//! 2. **Review** (buyer input order): each buyer ranks the received slot
//!    offers (see [`negotiation`](super::negotiation)) and greedily accepts
//!    one slot per vendor up to its remaining capacity. Acceptances are
//!    final; rejections are recorded per pair.
//! 3. **Settle**: a round in which some vendor below its minimum found no
//!    eligible buyer ends the phase with
//!    [`FailureReason::VendorMinimumsUnmet`]. Eligibility only shrinks, so
//!    that vendor could never recover.
//!
//! A buyer is eligible for a vendor when they have not met yet, the buyer
//! has capacity left, a shared slot is free for both, and the buyer has
//! rejected the vendor fewer than `max_rejections_per_pair` times.
//!
//! # Complexity
//! Each round either books a meeting or records a rejection for a pair
//! whose count is bounded, so at most `V·B·(max_rejections + 1)` rounds.
//!
//! # Reference
//! Gale & Shapley (1962), "College Admissions and the Stability of Marriage"

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::context::MatchContext;
use super::negotiation::{allocate, Offer};
use super::state::{Ledger, SlotProposal};
use super::trace::{progress_bar, TraceDetails, TraceEventKind, TraceSink};
use crate::models::{FailureReason, Meeting, MeetingPhase, VendorFailure};

/// Outcome of Phase 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase1Result {
    /// Whether every vendor reached its minimum.
    pub success: bool,
    /// Meetings booked in Phase 1 (partial when unsuccessful).
    pub assignments: Vec<Meeting>,
    /// Vendors below their minimum (empty on success).
    pub errors: Vec<VendorFailure>,
    /// Why the phase failed.
    pub failure_reason: Option<FailureReason>,
    /// Rounds started.
    pub iterations: usize,
    /// Meetings per vendor.
    pub vendor_meeting_counts: BTreeMap<String, usize>,
}

/// Progress of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    /// Still negotiating.
    Running,
    /// Finished; all targets reached.
    Succeeded,
    /// Finished without reaching every target.
    Failed(FailureReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Begin,
    Propose(usize),
    Review(usize),
    Settle,
}

/// Stepwise Phase 1 engine.
#[derive(Debug, Clone)]
pub(crate) struct Phase1 {
    cursor: Cursor,
    status: PhaseStatus,
    iteration: usize,
    stranded: usize,
}

impl Phase1 {
    pub(crate) fn new() -> Self {
        Self {
            cursor: Cursor::Begin,
            status: PhaseStatus::Running,
            iteration: 0,
            stranded: 0,
        }
    }

    pub(crate) fn status(&self) -> PhaseStatus {
        self.status
    }

    /// Applies one transition: a round start, one vendor's proposal, one
    /// buyer's review, or the round settlement.
    pub(crate) fn step(&mut self, ctx: &MatchContext<'_>, ledger: &mut Ledger, sink: &mut TraceSink) {
        if self.status != PhaseStatus::Running {
            return;
        }

        match self.cursor {
            Cursor::Begin => self.begin(ctx, ledger, sink),
            Cursor::Propose(v) if v < ctx.vendors.len() => {
                self.propose(ctx, ledger, sink, v);
                self.cursor = Cursor::Propose(v + 1);
            }
            Cursor::Propose(_) => self.cursor = Cursor::Review(0),
            Cursor::Review(b) if b < ctx.buyers.len() => {
                self.review(ctx, ledger, sink, b);
                self.cursor = Cursor::Review(b + 1);
            }
            Cursor::Review(_) => self.cursor = Cursor::Settle,
            Cursor::Settle => self.settle(ctx, ledger, sink),
        }
    }

    /// Summarizes the phase so far.
    pub(crate) fn result(&self, ctx: &MatchContext<'_>, ledger: &Ledger) -> Phase1Result {
        let failure_reason = match self.status {
            PhaseStatus::Failed(reason) => Some(reason),
            _ => None,
        };
        Phase1Result {
            success: self.status == PhaseStatus::Succeeded,
            assignments: ledger.meetings().to_vec(),
            errors: if failure_reason.is_some() {
                vendor_failures(ctx, ledger)
            } else {
                Vec::new()
            },
            failure_reason,
            iterations: self.iteration,
            vendor_meeting_counts: ctx
                .vendors
                .iter()
                .enumerate()
                .map(|(i, v)| (v.id.clone(), ledger.meetings_count(i)))
                .collect(),
        }
    }

    fn begin(&mut self, ctx: &MatchContext<'_>, ledger: &Ledger, sink: &mut TraceSink) {
        let unmet = (0..ctx.vendors.len())
            .filter(|&v| ledger.meetings_count(v) < ctx.min_meetings())
            .count();

        if unmet == 0 {
            self.status = PhaseStatus::Succeeded;
            tracing::info!(
                iterations = self.iteration,
                meetings = ledger.meetings().len(),
                "phase 1 complete"
            );
            sink.emit(TraceEventKind::Success, "PHASE 1 COMPLETE");
            sink.emit(
                TraceEventKind::Info,
                format!(
                    "All vendors satisfied | {} iterations | {} meetings",
                    self.iteration,
                    ledger.meetings().len()
                ),
            );
            return;
        }

        if self.iteration >= ctx.config.max_iterations {
            self.fail(ctx, ledger, sink, FailureReason::IterationLimitExceeded);
            return;
        }

        self.iteration += 1;
        self.stranded = 0;
        tracing::debug!(iteration = self.iteration, unmet, "phase 1 round");
        sink.emit(
            TraceEventKind::IterationStart,
            format!("Iteration {:03}", self.iteration),
        );
        self.cursor = Cursor::Propose(0);
    }

    fn propose(&mut self, ctx: &MatchContext<'_>, ledger: &mut Ledger, sink: &mut TraceSink, v: usize) {
        if ledger.meetings_count(v) >= ctx.min_meetings() {
            return;
        }
        let vendor = &ctx.vendors[v];
        let max_rejections = ctx.config.max_rejections_per_pair;

        let choice = ctx.preferences.for_vendor(&vendor.id).iter().find_map(|pref| {
            let b = ctx.buyer_index(&pref.buyer_id)?;
            let rejected = ledger
                .vendor(v)
                .map(|s| s.times_rejected_by(&pref.buyer_id))
                .unwrap_or(0);
            if ledger.is_matched(v, &pref.buyer_id)
                || ledger.remaining_capacity(b) == 0
                || rejected >= max_rejections
            {
                return None;
            }
            let slots = ledger.free_slots(ctx, v, b);
            (!slots.is_empty()).then_some((b, pref, slots))
        });

        let Some((b, pref, slots)) = choice else {
            tracing::debug!(vendor = %vendor.id, "no eligible buyer left");
            self.stranded += 1;
            return;
        };

        let rank = ctx.buyer_rank(b, v).unwrap_or(usize::MAX);
        let flexibility = slots.len();
        tracing::debug!(vendor = %vendor.id, buyer = %pref.buyer_id, slots = flexibility, "proposal");
        sink.emit_with(
            TraceEventKind::Proposal,
            format!("{} --> {}", vendor.id, pref.buyer_id),
            TraceDetails::pair(&vendor.id, &pref.buyer_id)
                .with_score(pref.score, pref.tier)
                .with_slots(flexibility),
        );

        for slot in slots {
            ledger.push_proposal(
                b,
                SlotProposal {
                    vendor_id: vendor.id.clone(),
                    slot,
                    score: pref.score,
                    tier: pref.tier,
                    buyer_preference_rank: rank,
                    flexibility,
                },
            );
        }
    }

    fn review(&mut self, ctx: &MatchContext<'_>, ledger: &mut Ledger, sink: &mut TraceSink, b: usize) {
        let proposals = ledger.take_proposals(b);
        if proposals.is_empty() {
            return;
        }
        let buyer_id = &ctx.buyers[b].id;

        let mut arrivals: Vec<usize> = Vec::new();
        let mut offers = Vec::with_capacity(proposals.len());
        for p in proposals {
            let Some(v) = ctx.vendor_index(&p.vendor_id) else {
                continue;
            };
            let arrival = match arrivals.iter().position(|&a| a == v) {
                Some(pos) => pos,
                None => {
                    arrivals.push(v);
                    arrivals.len() - 1
                }
            };
            offers.push(Offer {
                proposer: v,
                slot: p.slot,
                rank: p.buyer_preference_rank,
                score: p.score,
                tier: p.tier,
                flexibility: p.flexibility,
                arrival,
            });
        }

        let count = arrivals.len();
        tracing::debug!(buyer = %buyer_id, proposals = count, "buyer review");
        sink.emit_with(
            TraceEventKind::BuyerReview,
            format!(
                "{buyer_id} evaluating {count} proposal{}",
                if count == 1 { "" } else { "s" }
            ),
            TraceDetails::buyer(buyer_id),
        );

        let allocation = allocate(offers, ledger.remaining_capacity(b), |o| {
            ledger.can_book(o.proposer, b, &o.slot)
        });

        for offer in &allocation.accepted {
            let meeting = ledger.book(
                ctx,
                offer.proposer,
                b,
                offer.slot.clone(),
                offer.score,
                offer.tier,
                MeetingPhase::VendorMinimum,
            );
            sink.emit_with(
                TraceEventKind::Acceptance,
                format!("{} <<< {}", meeting.buyer_id, meeting.vendor_id),
                TraceDetails::pair(&meeting.vendor_id, &meeting.buyer_id)
                    .with_score(meeting.score, meeting.tier)
                    .with_time_slot(&meeting.time_slot),
            );
        }

        let preferred = allocation
            .accepted
            .first()
            .map(|o| ctx.vendors[o.proposer].id.as_str());
        for &v in &allocation.rejected {
            ledger.record_rejection(v, buyer_id, self.iteration);
            let vendor_id = &ctx.vendors[v].id;
            let reason = match (allocation.capacity_exhausted, preferred) {
                (true, Some(best)) => format!("prefers {best}"),
                (true, None) => "no capacity left".to_string(),
                (false, _) => "offered slots taken".to_string(),
            };
            sink.emit_with(
                TraceEventKind::Rejection,
                format!("{buyer_id} xxx {vendor_id}"),
                TraceDetails::pair(vendor_id, buyer_id).with_reason(reason),
            );
        }
    }

    fn settle(&mut self, ctx: &MatchContext<'_>, ledger: &Ledger, sink: &mut TraceSink) {
        let status = ctx
            .vendors
            .iter()
            .enumerate()
            .map(|(i, v)| progress_bar(&v.id, ledger.meetings_count(i), ctx.min_meetings()))
            .collect::<Vec<_>>()
            .join("  ");
        sink.emit(TraceEventKind::StatusSnapshot, status);

        if self.stranded > 0 {
            self.fail(ctx, ledger, sink, FailureReason::VendorMinimumsUnmet);
        } else {
            self.cursor = Cursor::Begin;
        }
    }

    fn fail(
        &mut self,
        ctx: &MatchContext<'_>,
        ledger: &Ledger,
        sink: &mut TraceSink,
        reason: FailureReason,
    ) {
        self.status = PhaseStatus::Failed(reason);
        let failures = vendor_failures(ctx, ledger);
        tracing::warn!(
            %reason,
            iterations = self.iteration,
            vendors_below_minimum = failures.len(),
            "phase 1 failed"
        );
        sink.emit_with(
            TraceEventKind::Error,
            "PHASE 1 FAILED",
            TraceDetails::default().with_reason(reason.to_string()),
        );
        for f in &failures {
            sink.emit_with(
                TraceEventKind::Error,
                format!(
                    "{}: {}/{} meetings ({} candidates, {} rejections)",
                    f.vendor_id, f.achieved, f.required, f.total_preferences, f.rejection_count
                ),
                TraceDetails::vendor(&f.vendor_id),
            );
        }
    }
}

/// One [`VendorFailure`] per vendor below its minimum.
pub(crate) fn vendor_failures(ctx: &MatchContext<'_>, ledger: &Ledger) -> Vec<VendorFailure> {
    ctx.vendors
        .iter()
        .enumerate()
        .filter(|&(i, _)| ledger.meetings_count(i) < ctx.min_meetings())
        .map(|(i, v)| VendorFailure {
            vendor_id: v.id.clone(),
            achieved: ledger.meetings_count(i),
            required: ctx.min_meetings(),
            total_preferences: ctx.preferences.for_vendor(&v.id).len(),
            rejection_count: ledger.vendor(i).map(|s| s.total_rejections()).unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Buyer, DailySchedule, SchedulerConfig, SectorPriority, Vendor};
    use crate::scheduler::trace::LogicalClock;

    fn run(ctx: &MatchContext<'_>) -> (Phase1Result, Ledger, Vec<TraceEventKind>) {
        run_from(ctx, Ledger::new(ctx))
    }

    fn run_from(
        ctx: &MatchContext<'_>,
        mut ledger: Ledger,
    ) -> (Phase1Result, Ledger, Vec<TraceEventKind>) {
        let mut sink = TraceSink::new(LogicalClock::default());
        let mut phase = Phase1::new();
        while phase.status() == PhaseStatus::Running {
            phase.step(ctx, &mut ledger, &mut sink);
        }
        let mut kinds = Vec::new();
        while let Some(e) = sink.pop() {
            kinds.push(e.kind);
        }
        (phase.result(ctx, &ledger), ledger, kinds)
    }

    fn one_day(min: usize, max: usize, window_end: &str) -> SchedulerConfig {
        SchedulerConfig::new("2025-01-15", "2025-01-15")
            .with_daily_schedule(DailySchedule::new("2025-01-15").with_window("09:00", window_end))
            .with_meetings_per_vendor(min, max)
    }

    #[test]
    fn test_all_vendors_reach_minimum() {
        let config = one_day(2, 3, "11:00");
        let vendors: Vec<Vendor> = ["V1", "V2", "V3"]
            .iter()
            .map(|id| Vendor::new(*id).with_sector("tech").with_available_date("2025-01-15"))
            .collect();
        let buyers: Vec<Buyer> = ["B1", "B2"]
            .iter()
            .map(|id| {
                Buyer::new(*id)
                    .with_sector_priority(SectorPriority::new("tech", 1))
                    .with_available_date("2025-01-15")
            })
            .collect();
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let (result, ledger, kinds) = run(&ctx);

        assert!(result.success);
        assert_eq!(result.assignments.len(), 6);
        assert!(result.errors.is_empty());
        assert!(result.vendor_meeting_counts.values().all(|&c| c == 2));
        assert!(ledger
            .meetings()
            .iter()
            .all(|m| m.phase == MeetingPhase::VendorMinimum));
        assert_eq!(kinds.first(), Some(&TraceEventKind::IterationStart));
        assert!(kinds.contains(&TraceEventKind::Acceptance));
        assert_eq!(kinds.last(), Some(&TraceEventKind::Info));
    }

    #[test]
    fn test_buyer_prefers_higher_ranked_vendor() {
        // One slot, two vendors: B1 ranks V2 (retail, priority 1) above V1.
        let config = one_day(1, 1, "09:30");
        let vendors = vec![
            Vendor::new("V1").with_sector("tech").with_available_date("2025-01-15"),
            Vendor::new("V2").with_sector("retail").with_available_date("2025-01-15"),
        ];
        let buyers = vec![Buyer::new("B1")
            .with_sector_priority(SectorPriority::new("retail", 1))
            .with_sector_priority(SectorPriority::new("tech", 5))
            .with_available_date("2025-01-15")];
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let (result, ledger, kinds) = run(&ctx);

        assert!(!result.success);
        assert_eq!(result.failure_reason, Some(FailureReason::VendorMinimumsUnmet));
        assert_eq!(result.assignments.len(), 1);
        assert_eq!(result.assignments[0].vendor_id, "V2");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].vendor_id, "V1");
        assert_eq!(result.errors[0].rejection_count, 1);
        assert_eq!(ledger.vendor(0).unwrap().times_rejected_by("B1"), 1);
        assert!(kinds.contains(&TraceEventKind::Rejection));
        assert_eq!(kinds.last(), Some(&TraceEventKind::Error));
    }

    #[test]
    fn test_lower_ranked_vendor_gets_next_slot() {
        let config = one_day(1, 1, "10:00");
        let vendors = vec![
            Vendor::new("V1").with_sector("tech").with_available_date("2025-01-15"),
            Vendor::new("V2").with_sector("retail").with_available_date("2025-01-15"),
        ];
        let buyers = vec![Buyer::new("B1")
            .with_sector_priority(SectorPriority::new("retail", 1))
            .with_sector_priority(SectorPriority::new("tech", 5))
            .with_available_date("2025-01-15")];
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let (result, _, _) = run(&ctx);

        // Both vendors offer both slots; B1 gives V2 09:00 and V1 09:30.
        assert!(result.success);
        assert_eq!(result.iterations, 1);
        let v1 = result.assignments.iter().find(|m| m.vendor_id == "V1").unwrap();
        assert_eq!(v1.time_slot.time, "09:30");
    }

    #[test]
    fn test_iteration_limit() {
        let config = one_day(2, 2, "11:00").with_max_iterations(1);
        let vendors = vec![Vendor::new("V1").with_available_date("2025-01-15")];
        let buyers = vec![
            Buyer::new("B1").with_available_date("2025-01-15"),
            Buyer::new("B2").with_available_date("2025-01-15"),
        ];
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let (result, _, _) = run(&ctx);

        assert!(!result.success);
        assert_eq!(result.failure_reason, Some(FailureReason::IterationLimitExceeded));
        assert_eq!(result.iterations, 1);
        assert_eq!(result.errors[0].achieved, 1);
    }

    #[test]
    fn test_zero_minimum_succeeds_immediately() {
        let config = one_day(0, 2, "10:00");
        let vendors = vec![Vendor::new("V1")];
        let buyers = vec![Buyer::new("B1")];
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let (result, _, _) = run(&ctx);

        assert!(result.success);
        assert_eq!(result.iterations, 0);
        assert!(result.assignments.is_empty());
    }

    #[test]
    fn test_stranded_vendor_fails_round_early() {
        // V1 shares no date with any buyer; V2 still has buyers to propose to.
        let config = one_day(2, 2, "11:00");
        let vendors = vec![
            Vendor::new("V1"),
            Vendor::new("V2").with_available_date("2025-01-15"),
        ];
        let buyers = vec![
            Buyer::new("B1").with_available_date("2025-01-15"),
            Buyer::new("B2").with_available_date("2025-01-15"),
        ];
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let (result, _, kinds) = run(&ctx);

        assert!(!result.success);
        assert_eq!(result.failure_reason, Some(FailureReason::VendorMinimumsUnmet));
        assert_eq!(result.iterations, 1);
        assert_eq!(result.vendor_meeting_counts["V2"], 1);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].vendor_id, "V1");
        assert_eq!(result.errors[0].achieved, 0);
        assert_eq!(result.errors[1].achieved, 1);
        assert_eq!(
            kinds.iter().filter(|&&k| k == TraceEventKind::IterationStart).count(),
            1
        );
    }

    fn single_pair() -> (Vec<Vendor>, Vec<Buyer>) {
        (
            vec![Vendor::new("V1").with_available_date("2025-01-15")],
            vec![Buyer::new("B1").with_available_date("2025-01-15")],
        )
    }

    #[test]
    fn test_rejected_vendor_proposes_again_below_limit() {
        let config = one_day(1, 1, "10:00");
        let (vendors, buyers) = single_pair();
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let mut ledger = Ledger::new(&ctx);
        ledger.record_rejection(0, "B1", 1);

        let (result, ledger, kinds) = run_from(&ctx, ledger);
        assert!(result.success);
        assert_eq!(result.assignments.len(), 1);
        assert_eq!(result.assignments[0].buyer_id, "B1");
        assert_eq!(ledger.vendor(0).unwrap().times_rejected_by("B1"), 1);
        assert!(kinds.contains(&TraceEventKind::Proposal));
    }

    #[test]
    fn test_rejection_limit_stops_proposals() {
        // Default limit: two rejections end the pair.
        let config = one_day(1, 1, "10:00");
        let (vendors, buyers) = single_pair();
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let mut ledger = Ledger::new(&ctx);
        ledger.record_rejection(0, "B1", 1);
        ledger.record_rejection(0, "B1", 2);

        let (result, _, kinds) = run_from(&ctx, ledger);
        assert!(!result.success);
        assert_eq!(result.failure_reason, Some(FailureReason::VendorMinimumsUnmet));
        assert!(result.assignments.is_empty());
        assert_eq!(result.errors[0].rejection_count, 2);
        assert!(!kinds.contains(&TraceEventKind::Proposal));

        // A limit of one ends the pair after the first rejection.
        let config = one_day(1, 1, "10:00").with_max_rejections_per_pair(1);
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let mut ledger = Ledger::new(&ctx);
        ledger.record_rejection(0, "B1", 1);

        let (result, _, kinds) = run_from(&ctx, ledger);
        assert!(!result.success);
        assert_eq!(result.iterations, 1);
        assert!(result.assignments.is_empty());
        assert!(!kinds.contains(&TraceEventKind::Proposal));
    }
}
