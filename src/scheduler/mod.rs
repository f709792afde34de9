//! Two-phase stable meeting scheduler.
//!
//! # Algorithm
//!
//! 1. **Phase 1** (vendor-proposing deferred acceptance): every vendor is
//!    brought to `min_meetings_per_vendor`. Failure here ends the run with a
//!    partial schedule and one [`VendorFailure`](crate::models::VendorFailure)
//!    per vendor below its minimum.
//! 2. **Phase 2** (buyer-proposing): remaining buyer capacity is filled up to
//!    `max_meetings_per_vendor`, never touching Phase 1 meetings.
//! 3. **Stability check**: unmatched pairs that would both rather meet are
//!    reported as blocking pairs.
//! 4. **Statistics**: utilization, score, tier, and phase breakdowns.
//!
//! A [`ScheduleRun`] exposes the pipeline as an iterator of
//! [`TraceEvent`]s; [`MatchScheduler`] validates input and builds runs.
//!
//! # References
//!
//! - Gale & Shapley (1962), "College Admissions and the Stability of Marriage"
//! - Roth & Sotomayor (1990), "Two-Sided Matching"

mod context;
mod engine;
mod negotiation;
mod phase1;
mod phase2;
mod run;
mod stability;
mod state;
mod statistics;
mod trace;

pub use context::MatchContext;
pub use engine::{MatchScheduler, ScheduleRequest};
pub use phase1::{Phase1Result, PhaseStatus};
pub use phase2::Phase2Result;
pub use run::ScheduleRun;
pub use stability::verify_stability;
pub use state::{Booking, BuyerState, Ledger, RejectionInfo, SlotProposal, VendorState};
pub use statistics::ScheduleStatistics;
pub use trace::{LogicalClock, TraceDetails, TraceEvent, TraceEventKind, DEFAULT_TICK_MS};
