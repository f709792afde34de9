//! Two-phase stable meeting scheduler for vendor-buyer events.
//!
//! Assigns one-to-one meetings between vendors and buyers at a trade show
//! or matchmaking event. Every vendor must reach a minimum number of
//! meetings; remaining buyer capacity is then filled up to a per-vendor
//! maximum; the result is checked for stability.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Vendor`, `Buyer`, `TimeSlot`,
//!   `SchedulerConfig`, `Meeting`, `ScheduleResult`
//! - **`matching`**: Compatibility scoring, slot overlap, preference lists
//! - **`scheduler`**: Phase 1 and Phase 2 negotiation, stability check,
//!   statistics, and the stepwise `ScheduleRun` trace
//! - **`validation`**: Config and input integrity checks
//! - **`error`**: `ScheduleError`
//!
//! # Example
//!
//! ```
//! use u_meeting::models::{Buyer, DailySchedule, SchedulerConfig, Vendor};
//! use u_meeting::{MatchScheduler, ScheduleRequest};
//!
//! let config = SchedulerConfig::new("2025-01-15", "2025-01-15")
//!     .with_daily_schedule(DailySchedule::new("2025-01-15").with_window("09:00", "10:00"))
//!     .with_meetings_per_vendor(1, 1);
//! let request = ScheduleRequest::new(
//!     config,
//!     vec![Vendor::new("V1").with_available_date("2025-01-15")],
//!     vec![Buyer::new("B1").with_available_date("2025-01-15")],
//! );
//!
//! let mut run = MatchScheduler::new().run(&request).unwrap();
//! for event in run.by_ref() {
//!     println!("{:?} {}", event.kind, event.message);
//! }
//! assert!(run.result().unwrap().success);
//! ```
//!
//! # References
//!
//! - Gale & Shapley (1962), "College Admissions and the Stability of Marriage"
//! - Roth & Sotomayor (1990), "Two-Sided Matching"

pub mod error;
pub mod matching;
pub mod models;
pub mod scheduler;
pub mod validation;

pub use error::ScheduleError;
pub use scheduler::{MatchScheduler, ScheduleRequest, ScheduleRun};
