//! Structured trace of a scheduling run.
//!
//! Every engine step yields [`TraceEvent`]s describing what happened:
//! proposals, reviews, acceptances, rejections, per-iteration status, and
//! phase boundaries. Events carry a sequence number and a timestamp from a
//! logical clock (`epoch + sequence × tick`), so two runs over the same
//! input produce identical traces.
//!
//! Trace events are domain output for replay and display; diagnostic
//! logging goes through `tracing` separately.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Tier, TimeSlot};

/// Default spacing between consecutive events (ms).
pub const DEFAULT_TICK_MS: u32 = 100;

/// Category of a trace event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraceEventKind {
    /// Run header.
    RunStart,
    /// Start of a phase.
    PhaseBoundary,
    /// Start of a negotiation round.
    IterationStart,
    /// A party proposes to another.
    Proposal,
    /// A reviewer accepts a proposal.
    Acceptance,
    /// A reviewer declines a proposal.
    Rejection,
    /// A reviewer starts evaluating its proposals.
    BuyerReview,
    /// Progress summary after a round.
    StatusSnapshot,
    /// A phase or the run finished successfully.
    Success,
    /// A phase or the run failed.
    Error,
    /// Any other information.
    Info,
}

/// Optional structured payload of a trace event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceDetails {
    /// Vendor involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    /// Buyer involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_id: Option<String>,
    /// Pair score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Pair tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    /// Booked slot (`YYYY-MM-DDTHH:MM:SS`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<String>,
    /// Number of slots offered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<usize>,
    /// Why something was declined or failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TraceDetails {
    /// Details naming a vendor-buyer pair.
    pub fn pair(vendor_id: impl Into<String>, buyer_id: impl Into<String>) -> Self {
        Self {
            vendor_id: Some(vendor_id.into()),
            buyer_id: Some(buyer_id.into()),
            ..Self::default()
        }
    }

    /// Details naming a buyer only.
    pub fn buyer(buyer_id: impl Into<String>) -> Self {
        Self {
            buyer_id: Some(buyer_id.into()),
            ..Self::default()
        }
    }

    /// Details naming a vendor only.
    pub fn vendor(vendor_id: impl Into<String>) -> Self {
        Self {
            vendor_id: Some(vendor_id.into()),
            ..Self::default()
        }
    }

    /// Adds score and tier.
    pub fn with_score(mut self, score: f64, tier: Tier) -> Self {
        self.score = Some(score);
        self.tier = Some(tier);
        self
    }

    /// Adds the booked slot.
    pub fn with_time_slot(mut self, slot: &TimeSlot) -> Self {
        self.time_slot = Some(slot.datetime.clone());
        self
    }

    /// Adds the number of offered slots.
    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slots = Some(slots);
        self
    }

    /// Adds a reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// One entry of the run trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Position in the trace, starting at 0.
    pub sequence: u64,
    /// Logical timestamp.
    pub timestamp: DateTime<Utc>,
    /// Category.
    pub kind: TraceEventKind,
    /// Human-readable line.
    pub message: String,
    /// Structured payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<TraceDetails>,
}

/// Deterministic clock: `epoch + sequence × tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalClock {
    /// Timestamp of event 0.
    pub epoch: DateTime<Utc>,
    /// Spacing between events (ms).
    pub tick_ms: u32,
}

impl Default for LogicalClock {
    fn default() -> Self {
        Self {
            epoch: DateTime::<Utc>::UNIX_EPOCH,
            tick_ms: DEFAULT_TICK_MS,
        }
    }
}

impl LogicalClock {
    /// Timestamp of the event at `sequence`.
    ///
    /// Saturates at the latest representable instant.
    pub fn at(&self, sequence: u64) -> DateTime<Utc> {
        let offset = i64::try_from(sequence)
            .unwrap_or(i64::MAX)
            .saturating_mul(i64::from(self.tick_ms));
        Duration::try_milliseconds(offset)
            .and_then(|d| self.epoch.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Queue of emitted, not yet consumed events.
#[derive(Debug, Clone, Default)]
pub(crate) struct TraceSink {
    clock: LogicalClock,
    next_sequence: u64,
    pending: VecDeque<TraceEvent>,
}

impl TraceSink {
    pub(crate) fn new(clock: LogicalClock) -> Self {
        Self {
            clock,
            next_sequence: 0,
            pending: VecDeque::new(),
        }
    }

    pub(crate) fn emit(&mut self, kind: TraceEventKind, message: impl Into<String>) {
        self.push(kind, message.into(), None);
    }

    pub(crate) fn emit_with(
        &mut self,
        kind: TraceEventKind,
        message: impl Into<String>,
        details: TraceDetails,
    ) {
        self.push(kind, message.into(), Some(details));
    }

    pub(crate) fn pop(&mut self) -> Option<TraceEvent> {
        self.pending.pop_front()
    }

    fn push(&mut self, kind: TraceEventKind, message: String, details: Option<TraceDetails>) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.push_back(TraceEvent {
            sequence,
            timestamp: self.clock.at(sequence),
            kind,
            message,
            details,
        });
    }
}

/// Progress bar of one vendor: `V1: [#-] 1/2`, with `✓` once satisfied.
pub(crate) fn progress_bar(vendor_id: &str, count: usize, target: usize) -> String {
    let filled = count.min(target);
    let bar: String = "#".repeat(filled) + &"-".repeat(target - filled);
    let mark = if count >= target { " ✓" } else { "" };
    format!("{vendor_id}: [{bar}] {count}/{target}{mark}")
}
