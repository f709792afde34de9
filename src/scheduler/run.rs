//! Stepwise scheduling run.
//!
//! [`ScheduleRun`] is an explicit state machine over the whole pipeline:
//!
//! ```text
//! Start → Negotiate (Phase 1) → Fill (Phase 2) → Verify → Summarize → Done
//!                  └── on failure ───────────────────────┘
//! ```
//!
//! Each internal step applies one logical transition and queues the trace
//! events it produced. [`Iterator::next`] drains that queue before stepping
//! again, so a caller can drive the run one event at a time (for replay or
//! display) or finish it at once with [`ScheduleRun::into_result`]. Both
//! give the same result.

use std::collections::BTreeMap;

use super::context::MatchContext;
use super::phase1::{Phase1, Phase1Result, PhaseStatus};
use super::phase2::{Phase2, Phase2Result};
use super::stability::verify_stability;
use super::state::Ledger;
use super::statistics::ScheduleStatistics;
use super::trace::{LogicalClock, TraceDetails, TraceEvent, TraceEventKind, TraceSink};
use crate::models::{ScheduleResult, StabilityReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Start,
    Negotiate,
    Fill,
    Verify,
    Summarize,
    Done,
}

/// A scheduling run in progress.
///
/// Yields [`TraceEvent`]s. Dropping the run cancels it.
#[derive(Debug, Clone)]
pub struct ScheduleRun<'a> {
    ctx: MatchContext<'a>,
    ledger: Ledger,
    sink: TraceSink,
    stage: Stage,
    phase1: Phase1,
    phase2: Phase2,
    phase1_result: Option<Phase1Result>,
    phase2_result: Option<Phase2Result>,
    stability: Option<StabilityReport>,
    result: Option<ScheduleResult>,
}

impl<'a> ScheduleRun<'a> {
    /// Starts a run over a prepared context.
    pub fn new(ctx: MatchContext<'a>, clock: LogicalClock) -> Self {
        let ledger = Ledger::new(&ctx);
        let phase2 = Phase2::new(ctx.vendors.len());
        Self {
            ctx,
            ledger,
            sink: TraceSink::new(clock),
            stage: Stage::Start,
            phase1: Phase1::new(),
            phase2,
            phase1_result: None,
            phase2_result: None,
            stability: None,
            result: None,
        }
    }

    /// Read-only inputs of the run.
    pub fn context(&self) -> &MatchContext<'a> {
        &self.ctx
    }

    /// Negotiation state so far.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Whether every step has been applied.
    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Phase 1 outcome, once the phase ended.
    pub fn phase1_result(&self) -> Option<&Phase1Result> {
        self.phase1_result.as_ref()
    }

    /// Phase 2 outcome, once the phase ended.
    pub fn phase2_result(&self) -> Option<&Phase2Result> {
        self.phase2_result.as_ref()
    }

    /// Final result, once the run finished.
    pub fn result(&self) -> Option<&ScheduleResult> {
        self.result.as_ref()
    }

    /// Applies all remaining steps and returns the final result.
    ///
    /// Unconsumed trace events are discarded.
    pub fn into_result(mut self) -> ScheduleResult {
        while self.stage != Stage::Done {
            self.step();
        }
        match self.result.take() {
            Some(result) => result,
            None => self.build_result(),
        }
    }

    fn step(&mut self) {
        match self.stage {
            Stage::Start => self.start(),
            Stage::Negotiate => self.negotiate(),
            Stage::Fill => self.fill(),
            Stage::Verify => self.verify(),
            Stage::Summarize => self.summarize(),
            Stage::Done => {}
        }
    }

    fn start(&mut self) {
        let ctx = &self.ctx;
        tracing::info!(
            vendors = ctx.vendors.len(),
            buyers = ctx.buyers.len(),
            slots = ctx.time_slots.len(),
            min = ctx.min_meetings(),
            max = ctx.max_meetings(),
            "scheduling run started"
        );
        self.sink
            .emit(TraceEventKind::RunStart, "STABLE MATCHING SCHEDULER");
        self.sink.emit(
            TraceEventKind::Info,
            format!(
                "{} vendors | {} buyers | {} time slots",
                ctx.vendors.len(),
                ctx.buyers.len(),
                ctx.time_slots.len()
            ),
        );
        self.sink
            .emit(TraceEventKind::PhaseBoundary, "Phase 1: Vendor Minimums");
        self.sink.emit(
            TraceEventKind::Info,
            format!("Target: {} meetings per vendor", ctx.min_meetings()),
        );
        self.stage = Stage::Negotiate;
    }

    fn negotiate(&mut self) {
        self.phase1.step(&self.ctx, &mut self.ledger, &mut self.sink);

        match self.phase1.status() {
            PhaseStatus::Running => {}
            PhaseStatus::Succeeded => {
                self.phase1_result = Some(self.phase1.result(&self.ctx, &self.ledger));
                tracing::info!("phase 2 started");
                self.sink
                    .emit(TraceEventKind::PhaseBoundary, "Phase 2: Capacity Fill");
                self.sink.emit(
                    TraceEventKind::Info,
                    format!(
                        "Buyers fill remaining capacity | max {} meetings per vendor",
                        self.ctx.max_meetings()
                    ),
                );
                self.stage = Stage::Fill;
            }
            PhaseStatus::Failed(_) => {
                self.phase1_result = Some(self.phase1.result(&self.ctx, &self.ledger));
                self.stage = Stage::Summarize;
            }
        }
    }

    fn fill(&mut self) {
        self.phase2.step(&self.ctx, &mut self.ledger, &mut self.sink);
        if self.phase2.is_finished() {
            self.phase2_result = Some(self.phase2.result(&self.ctx, &self.ledger));
            self.stage = Stage::Verify;
        }
    }

    fn verify(&mut self) {
        self.sink
            .emit(TraceEventKind::PhaseBoundary, "Stability Verification");
        let report = verify_stability(self.ledger.meetings(), &self.ctx);

        if report.is_stable {
            tracing::info!(pairs_checked = report.total_pairs_checked, "schedule is stable");
            self.sink.emit(
                TraceEventKind::Success,
                format!(
                    "Stable | {} unmatched pairs checked",
                    report.total_pairs_checked
                ),
            );
        } else {
            tracing::warn!(
                blocking = report.blocking_pairs.len(),
                pairs_checked = report.total_pairs_checked,
                "blocking pairs found"
            );
            self.sink.emit(
                TraceEventKind::Error,
                format!(
                    "{} blocking pairs | {} unmatched pairs checked",
                    report.blocking_pairs.len(),
                    report.total_pairs_checked
                ),
            );
            for pair in &report.blocking_pairs {
                self.sink.emit_with(
                    TraceEventKind::Info,
                    format!("{} <-> {}", pair.vendor_id, pair.buyer_id),
                    TraceDetails::pair(&pair.vendor_id, &pair.buyer_id).with_reason(&pair.reason),
                );
            }
        }

        self.stability = Some(report);
        self.stage = Stage::Summarize;
    }

    fn summarize(&mut self) {
        let result = self.build_result();

        if result.success {
            let utilization = result
                .statistics
                .as_ref()
                .map(|s| s.utilization_rate)
                .unwrap_or(0.0);
            tracing::info!(
                meetings = result.assignments.len(),
                utilization,
                stable = result.is_stable(),
                "scheduling run complete"
            );
            self.sink.emit(TraceEventKind::Success, "SCHEDULE COMPLETE");
            self.sink.emit(
                TraceEventKind::Info,
                format!(
                    "{} meetings | {:.1}% buyer slots used",
                    result.assignments.len(),
                    utilization * 100.0
                ),
            );
        } else {
            let reason = result
                .failure_reason
                .map(|r| r.to_string())
                .unwrap_or_default();
            tracing::warn!(
                partial = result.partial_assignments.len(),
                vendors_below_minimum = result.errors.len(),
                %reason,
                "scheduling run failed"
            );
            self.sink.emit_with(
                TraceEventKind::Error,
                "SCHEDULE FAILED",
                TraceDetails::default().with_reason(reason),
            );
        }

        self.result = Some(result);
        self.stage = Stage::Done;
    }

    fn build_result(&self) -> ScheduleResult {
        let meetings = self.ledger.meetings().to_vec();
        let statistics = ScheduleStatistics::calculate(&meetings, &self.ctx);
        let vendor_meeting_counts: BTreeMap<String, usize> = self
            .ctx
            .vendors
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id.clone(), self.ledger.meetings_count(i)))
            .collect();

        if self.phase1.status() == PhaseStatus::Succeeded {
            ScheduleResult {
                success: true,
                assignments: meetings,
                partial_assignments: Vec::new(),
                statistics: Some(statistics),
                stability_report: self.stability.clone(),
                vendor_meeting_counts: Some(vendor_meeting_counts),
                errors: Vec::new(),
                failure_reason: None,
            }
        } else {
            let phase1 = self
                .phase1_result
                .clone()
                .unwrap_or_else(|| self.phase1.result(&self.ctx, &self.ledger));
            ScheduleResult {
                success: false,
                assignments: Vec::new(),
                partial_assignments: meetings,
                statistics: Some(statistics),
                stability_report: None,
                vendor_meeting_counts: Some(vendor_meeting_counts),
                errors: phase1.errors,
                failure_reason: phase1.failure_reason,
            }
        }
    }
}

impl Iterator for ScheduleRun<'_> {
    type Item = TraceEvent;

    fn next(&mut self) -> Option<TraceEvent> {
        loop {
            if let Some(event) = self.sink.pop() {
                return Some(event);
            }
            if self.stage == Stage::Done {
                return None;
            }
            self.step();
        }
    }
}
