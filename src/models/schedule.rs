//! Schedule (solution) model.
//!
//! A schedule is the set of confirmed vendor-buyer meetings plus the
//! reports produced about it: per-vendor failures when minimums cannot be
//! met, blocking pairs found by the stability check, and statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{Tier, TimeSlot};
use crate::scheduler::ScheduleStatistics;

/// Which phase produced a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeetingPhase {
    /// Phase 1: vendor minimums.
    VendorMinimum,
    /// Phase 2: capacity fill.
    CapacityFill,
}

impl MeetingPhase {
    /// Phase number (1 or 2).
    pub fn number(&self) -> u8 {
        match self {
            MeetingPhase::VendorMinimum => 1,
            MeetingPhase::CapacityFill => 2,
        }
    }
}

/// A confirmed meeting.
///
/// Records that a vendor meets a buyer in a slot at the buyer's table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    /// Vendor ID.
    pub vendor_id: String,
    /// Buyer ID.
    pub buyer_id: String,
    /// Booked slot.
    pub time_slot: TimeSlot,
    /// Room (the buyer's table).
    pub room_id: String,
    /// Pair compatibility score.
    pub score: f64,
    /// Pair tier.
    pub tier: Tier,
    /// Phase that created the meeting.
    pub phase: MeetingPhase,
}

/// Why Phase 1 could not bring a vendor to its minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorFailure {
    /// Vendor ID.
    pub vendor_id: String,
    /// Meetings reached.
    pub achieved: usize,
    /// Meetings required.
    pub required: usize,
    /// Length of the vendor's preference list.
    pub total_preferences: usize,
    /// Rejections received across all buyers.
    pub rejection_count: u32,
}

/// Reason a run finished unsuccessfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Some vendor ran out of candidates below its minimum.
    VendorMinimumsUnmet,
    /// The negotiation round cap was reached first.
    IterationLimitExceeded,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::VendorMinimumsUnmet => {
                f.write_str("vendor minimums unmet: preference lists exhausted")
            }
            FailureReason::IterationLimitExceeded => f.write_str("iteration limit exceeded"),
        }
    }
}

/// An unmatched pair that would both rather meet each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingPair {
    /// Vendor ID.
    pub vendor_id: String,
    /// Buyer ID.
    pub buyer_id: String,
    /// Human-readable explanation.
    pub reason: String,
    /// The vendor's worst current meeting, if any.
    pub vendor_current_match: Option<Meeting>,
    /// The buyer's worst current meeting, if any.
    pub buyer_current_match: Option<Meeting>,
}

/// Outcome of a stability check.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StabilityReport {
    /// `true` iff `blocking_pairs` is empty.
    pub is_stable: bool,
    /// Pairs that block the assignment.
    pub blocking_pairs: Vec<BlockingPair>,
    /// Unmatched, mutually available pairs examined.
    pub total_pairs_checked: usize,
}

/// Final output of one scheduling run.
///
/// Built once when the run finishes and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// Whether every vendor reached its minimum.
    pub success: bool,
    /// Final meetings. Empty when `success` is false.
    pub assignments: Vec<Meeting>,
    /// Meetings reached before Phase 1 gave up.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial_assignments: Vec<Meeting>,
    /// Statistics over `assignments` (or `partial_assignments` on failure).
    pub statistics: Option<ScheduleStatistics>,
    /// Stability check of `assignments`. Absent on failure.
    pub stability_report: Option<StabilityReport>,
    /// Meetings per vendor.
    pub vendor_meeting_counts: Option<BTreeMap<String, usize>>,
    /// Vendors that missed their minimum.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<VendorFailure>,
    /// Why the run failed.
    pub failure_reason: Option<FailureReason>,
}

impl Meeting {
    /// Creates a meeting at the buyer's table.
    pub fn new(
        vendor_id: impl Into<String>,
        buyer_id: impl Into<String>,
        time_slot: TimeSlot,
        score: f64,
        tier: Tier,
        phase: MeetingPhase,
    ) -> Self {
        let buyer_id = buyer_id.into();
        Self {
            room_id: room_for_buyer(&buyer_id),
            vendor_id: vendor_id.into(),
            buyer_id,
            time_slot,
            score,
            tier,
            phase,
        }
    }
}

/// Room ID of a buyer's table.
pub fn room_for_buyer(buyer_id: &str) -> String {
    format!("room-{buyer_id}")
}

impl ScheduleResult {
    /// Meetings that count for this result: final or partial.
    pub fn meetings(&self) -> &[Meeting] {
        if self.success {
            &self.assignments
        } else {
            &self.partial_assignments
        }
    }

    /// Number of final meetings.
    pub fn meeting_count(&self) -> usize {
        self.assignments.len()
    }

    /// Final meetings of a vendor.
    pub fn meetings_for_vendor(&self, vendor_id: &str) -> Vec<&Meeting> {
        self.assignments
            .iter()
            .filter(|m| m.vendor_id == vendor_id)
            .collect()
    }

    /// Final meetings of a buyer.
    pub fn meetings_for_buyer(&self, buyer_id: &str) -> Vec<&Meeting> {
        self.assignments
            .iter()
            .filter(|m| m.buyer_id == buyer_id)
            .collect()
    }

    /// The meeting between a vendor and a buyer, if any.
    pub fn meeting_between(&self, vendor_id: &str, buyer_id: &str) -> Option<&Meeting> {
        self.assignments
            .iter()
            .find(|m| m.vendor_id == vendor_id && m.buyer_id == buyer_id)
    }

    /// Whether the stability check found no blocking pairs.
    ///
    /// `false` when no check ran.
    pub fn is_stable(&self) -> bool {
        self.stability_report
            .as_ref()
            .map(|r| r.is_stable)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(time: &str) -> TimeSlot {
        TimeSlot::parse("2025-01-15", time).unwrap()
    }

    fn sample_result() -> ScheduleResult {
        ScheduleResult {
            success: true,
            assignments: vec![
                Meeting::new("V1", "B1", slot("09:00"), 0.8, Tier::Tier1, MeetingPhase::VendorMinimum),
                Meeting::new("V2", "B1", slot("09:30"), 0.5, Tier::Tier2, MeetingPhase::VendorMinimum),
                Meeting::new("V1", "B2", slot("10:00"), 0.4, Tier::Tier3, MeetingPhase::CapacityFill),
            ],
            partial_assignments: Vec::new(),
            statistics: None,
            stability_report: None,
            vendor_meeting_counts: None,
            errors: Vec::new(),
            failure_reason: None,
        }
    }

    #[test]
    fn test_meeting_room_is_buyer_table() {
        let m = Meeting::new("V1", "B7", slot("09:00"), 0.5, Tier::Tier2, MeetingPhase::CapacityFill);
        assert_eq!(m.room_id, "room-B7");
        assert_eq!(m.phase.number(), 2);
    }

    #[test]
    fn test_result_queries() {
        let r = sample_result();
        assert_eq!(r.meeting_count(), 3);
        assert_eq!(r.meetings_for_vendor("V1").len(), 2);
        assert_eq!(r.meetings_for_buyer("B1").len(), 2);
        assert!(r.meeting_between("V2", "B1").is_some());
        assert!(r.meeting_between("V2", "B2").is_none());
        assert!(!r.is_stable());
        assert_eq!(r.meetings().len(), 3);
    }

    #[test]
    fn test_failure_reason_display() {
        assert_eq!(
            FailureReason::IterationLimitExceeded.to_string(),
            "iteration limit exceeded"
        );
    }

    #[test]
    fn test_failed_result_exposes_partial_meetings() {
        let mut r = sample_result();
        r.success = false;
        r.partial_assignments = std::mem::take(&mut r.assignments);
        r.failure_reason = Some(FailureReason::VendorMinimumsUnmet);

        assert_eq!(r.meeting_count(), 0);
        assert_eq!(r.meetings().len(), 3);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["failure_reason"], "vendor_minimums_unmet");
        assert!(json.get("errors").is_none());
    }
}
