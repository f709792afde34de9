//! Meeting-scheduling domain models.
//!
//! Input records (vendors, buyers, calendar, configuration) are produced by
//! an external data layer and only borrowed by the engine. Output records
//! (meetings, failures, stability reports) are produced once per run.
//!
//! # Domain Mappings
//!
//! | u-meeting | Trade show | Recruiting fair | Investor day |
//! |-----------|-----------|-----------------|--------------|
//! | Vendor | Exhibitor | Employer | Startup |
//! | Buyer | Visitor | Candidate | Investor |
//! | TimeSlot | Meeting slot | Interview slot | Pitch slot |
//! | Meeting | Booth meeting | Interview | Pitch |

pub mod calendar;
mod buyer;
mod config;
mod schedule;
mod score;
mod vendor;

pub use buyer::{Buyer, SectorPriority, SubSectorPriority};
pub use calendar::{
    filter_slots_by_dates, generate_campaign_slots, generate_slots_from_window, CalendarError,
    DailySchedule, TimeSlot, TimeWindow,
};
pub use config::{SchedulerConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_REJECTIONS_PER_PAIR};
pub use schedule::{
    room_for_buyer, BlockingPair, FailureReason, Meeting, MeetingPhase, ScheduleResult,
    StabilityReport, VendorFailure,
};
pub use score::{MatchScore, ScoreBreakdown, Tier};
pub use vendor::Vendor;
