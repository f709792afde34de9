//! Schedule statistics.
//!
//! Aggregates a set of meetings into summary indicators.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total meetings | Number of meetings |
//! | Available slots | Sum of buyer capacities |
//! | Utilization | Meetings / available slots (0 when no slots) |
//! | Average score | Mean pair score (0 when no meetings) |
//! | Tier distribution | Meetings per tier |
//! | Phase split | Meetings created in Phase 1 and Phase 2 |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::context::MatchContext;
use crate::models::{Meeting, MeetingPhase, Tier};

/// Summary indicators of a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleStatistics {
    /// Number of meetings.
    pub total_meetings: usize,
    /// Sum of buyer capacities.
    pub total_available_slots: usize,
    /// `total_meetings / total_available_slots` (0.0..1.0).
    pub utilization_rate: f64,
    /// Meetings per vendor. Every vendor is listed.
    pub vendor_meeting_counts: BTreeMap<String, usize>,
    /// Meetings per buyer. Every buyer is listed.
    pub buyer_meeting_counts: BTreeMap<String, usize>,
    /// Mean pair score.
    pub average_score: f64,
    /// Meetings per tier.
    pub tier_distribution: BTreeMap<Tier, usize>,
    /// Meetings created in Phase 1.
    pub phase1_meetings: usize,
    /// Meetings created in Phase 2.
    pub phase2_meetings: usize,
}

impl ScheduleStatistics {
    /// Computes statistics from meetings and the run context.
    ///
    /// Meetings naming unknown vendors or buyers are still counted in the
    /// totals and listed under their own id.
    pub fn calculate(meetings: &[Meeting], ctx: &MatchContext<'_>) -> Self {
        let mut vendor_meeting_counts: BTreeMap<String, usize> =
            ctx.vendors.iter().map(|v| (v.id.clone(), 0)).collect();
        let mut buyer_meeting_counts: BTreeMap<String, usize> =
            ctx.buyers.iter().map(|b| (b.id.clone(), 0)).collect();
        let mut tier_distribution: BTreeMap<Tier, usize> = BTreeMap::new();
        let mut phase1_meetings = 0;
        let mut total_score = 0.0;

        for m in meetings {
            *vendor_meeting_counts.entry(m.vendor_id.clone()).or_default() += 1;
            *buyer_meeting_counts.entry(m.buyer_id.clone()).or_default() += 1;
            *tier_distribution.entry(m.tier).or_default() += 1;
            if m.phase == MeetingPhase::VendorMinimum {
                phase1_meetings += 1;
            }
            total_score += m.score;
        }

        let total_meetings = meetings.len();
        let total_available_slots = ctx.total_buyer_capacity();

        let utilization_rate = if total_available_slots == 0 {
            0.0
        } else {
            total_meetings as f64 / total_available_slots as f64
        };

        let average_score = if total_meetings == 0 {
            0.0
        } else {
            total_score / total_meetings as f64
        };

        Self {
            total_meetings,
            total_available_slots,
            utilization_rate,
            vendor_meeting_counts,
            buyer_meeting_counts,
            average_score,
            tier_distribution,
            phase1_meetings,
            phase2_meetings: total_meetings - phase1_meetings,
        }
    }

    /// Meetings in a tier.
    pub fn tier_count(&self, tier: Tier) -> usize {
        self.tier_distribution.get(&tier).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Buyer, DailySchedule, SchedulerConfig, TimeSlot, Vendor};

    fn slot(time: &str) -> TimeSlot {
        TimeSlot::parse("2025-01-15", time).unwrap()
    }

    fn setup() -> (Vec<Vendor>, Vec<Buyer>, SchedulerConfig) {
        // Four 30-minute slots.
        let config = SchedulerConfig::new("2025-01-15", "2025-01-15")
            .with_daily_schedule(DailySchedule::new("2025-01-15").with_window("09:00", "11:00"))
            .with_meetings_per_vendor(1, 3);
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
    fn test_statistics_basic() {
        let (vendors, buyers, config) = setup();
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let meetings = vec![
            Meeting::new("V1", "B1", slot("09:00"), 0.8, Tier::Tier1, MeetingPhase::VendorMinimum),
            Meeting::new("V1", "B2", slot("09:30"), 0.4, Tier::Tier2, MeetingPhase::VendorMinimum),
            Meeting::new("V2", "B1", slot("09:30"), 0.3, Tier::Tier2, MeetingPhase::CapacityFill),
        ];

        let stats = ScheduleStatistics::calculate(&meetings, &ctx);
        assert_eq!(stats.total_meetings, 3);
        assert_eq!(stats.total_available_slots, 8);
        assert!((stats.utilization_rate - 0.375).abs() < 1e-9);
        assert!((stats.average_score - 0.5).abs() < 1e-9);
        assert_eq!(stats.vendor_meeting_counts["V1"], 2);
        assert_eq!(stats.vendor_meeting_counts["V2"], 1);
        assert_eq!(stats.buyer_meeting_counts["B1"], 2);
        assert_eq!(stats.tier_count(Tier::Tier2), 2);
        assert_eq!(stats.tier_count(Tier::Tier3), 0);
        assert_eq!((stats.phase1_meetings, stats.phase2_meetings), (2, 1));
    }

    #[test]
    fn test_statistics_empty() {
        let (vendors, buyers, config) = setup();
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());

        let stats = ScheduleStatistics::calculate(&[], &ctx);
        assert_eq!(stats.total_meetings, 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.utilization_rate, 0.0);
        // Every party is listed even without meetings.
        assert_eq!(stats.vendor_meeting_counts.len(), 2);
        assert_eq!(stats.buyer_meeting_counts["B2"], 0);
    }

    #[test]
    fn test_zero_capacity_utilization() {
        let (vendors, mut buyers, config) = setup();
        for b in &mut buyers {
            b.available_dates.clear();
        }
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());

        let stats = ScheduleStatistics::calculate(&[], &ctx);
        assert_eq!(stats.total_available_slots, 0);
        assert_eq!(stats.utilization_rate, 0.0);
    }

    #[test]
    fn test_tier_keys_serialize() {
        let (vendors, buyers, config) = setup();
        let ctx = MatchContext::new(&vendors, &buyers, &config, config.time_slots().unwrap());
        let meetings = vec![Meeting::new(
            "V1",
            "B1",
            slot("09:00"),
            0.8,
            Tier::Tier1,
            MeetingPhase::VendorMinimum,
        )];

        let json = serde_json::to_value(ScheduleStatistics::calculate(&meetings, &ctx)).unwrap();
        assert_eq!(json["tier_distribution"]["tier-1"], 1);
    }
}
