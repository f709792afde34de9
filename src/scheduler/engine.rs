//! Scheduler facade.
//!
//! # Algorithm
//!
//! 1. Validate the configuration, then the participants (and supplied
//!    slots, if any).
//! 2. Generate slots from the daily windows unless supplied.
//! 3. Build the [`MatchContext`]: overlap matrix, preference lists, buyer
//!    capacities.
//! 4. Hand back a [`ScheduleRun`] that performs Phase 1, Phase 2, stability
//!    verification, and statistics.
//!
//! # Complexity
//! Setup is O(V·B·S) for S slots. See the phase modules for negotiation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::context::MatchContext;
use super::run::ScheduleRun;
use super::trace::{LogicalClock, TraceEvent};
use crate::error::ScheduleError;
use crate::models::{Buyer, ScheduleResult, SchedulerConfig, TimeSlot, Vendor};
use crate::validation::{validate_config, validate_input, validate_time_slots, ValidationError};

/// Input container for scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// Event configuration.
    pub config: SchedulerConfig,
    /// Vendors, in priority order for tie-breaks.
    pub vendors: Vec<Vendor>,
    /// Buyers, in priority order for tie-breaks.
    pub buyers: Vec<Buyer>,
    /// Bookable slots. Generated from `config` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slots: Option<Vec<TimeSlot>>,
}

impl ScheduleRequest {
    /// Creates a request with generated slots.
    pub fn new(config: SchedulerConfig, vendors: Vec<Vendor>, buyers: Vec<Buyer>) -> Self {
        Self {
            config,
            vendors,
            buyers,
            time_slots: None,
        }
    }

    /// Supplies the slots instead of generating them.
    pub fn with_time_slots(mut self, time_slots: Vec<TimeSlot>) -> Self {
        self.time_slots = Some(time_slots);
        self
    }
}

/// Two-phase stable meeting scheduler.
///
/// Stateless between runs; one instance can serve any number of requests.
///
/// # Example
///
/// ```
/// use u_meeting::models::{Buyer, DailySchedule, SchedulerConfig, SectorPriority, Vendor};
/// use u_meeting::scheduler::{MatchScheduler, ScheduleRequest};
///
/// let config = SchedulerConfig::new("2025-01-15", "2025-01-15")
///     .with_daily_schedule(DailySchedule::new("2025-01-15").with_window("09:00", "11:00"))
///     .with_meetings_per_vendor(1, 2);
/// let vendors = vec![
///     Vendor::new("V1").with_sector("retail").with_available_date("2025-01-15"),
///     Vendor::new("V2").with_sector("tech").with_available_date("2025-01-15"),
/// ];
/// let buyers = vec![
///     Buyer::new("B1")
///         .with_sector_priority(SectorPriority::new("retail", 1))
///         .with_available_date("2025-01-15"),
/// ];
/// let request = ScheduleRequest::new(config, vendors, buyers);
///
/// let result = MatchScheduler::new().schedule(&request).unwrap();
/// assert!(result.success);
/// assert_eq!(result.meetings_for_buyer("B1").len(), 2);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchScheduler {
    clock: LogicalClock,
}

impl MatchScheduler {
    /// Creates a scheduler with the default trace clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timestamp of the first trace event.
    pub fn with_trace_epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.clock.epoch = epoch;
        self
    }

    /// Sets the spacing between trace events (ms).
    pub fn with_trace_tick_ms(mut self, tick_ms: u32) -> Self {
        self.clock.tick_ms = tick_ms;
        self
    }

    /// Validates the request and prepares a stepwise run.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidConfig`] for an inconsistent configuration,
    /// [`ScheduleError::InvalidInput`] for unusable participants or slots.
    pub fn run<'a>(&self, request: &'a ScheduleRequest) -> Result<ScheduleRun<'a>, ScheduleError> {
        validate_config(&request.config).map_err(ScheduleError::InvalidConfig)?;

        let mut input_errors = validate_input(&request.vendors, &request.buyers)
            .err()
            .unwrap_or_default();
        if let Some(slots) = &request.time_slots {
            if let Err(errors) = validate_time_slots(slots) {
                input_errors.extend(errors);
            }
        }
        if !input_errors.is_empty() {
            tracing::warn!(errors = input_errors.len(), "invalid scheduling input");
            return Err(ScheduleError::InvalidInput(input_errors));
        }

        let time_slots = match &request.time_slots {
            Some(slots) => slots.clone(),
            None => request
                .config
                .time_slots()
                .map_err(|e| ScheduleError::InvalidConfig(vec![ValidationError::from(e)]))?,
        };

        let ctx = MatchContext::new(
            &request.vendors,
            &request.buyers,
            &request.config,
            time_slots,
        );
        tracing::debug!(
            feasible_pairs = ctx.preferences.feasible_pairs(),
            shared_slots = ctx.overlap.total_overlap(),
            total_buyer_capacity = ctx.total_buyer_capacity(),
            "context built"
        );
        Ok(ScheduleRun::new(ctx, self.clock))
    }

    /// Runs the whole pipeline and returns the result.
    ///
    /// # Errors
    /// See [`MatchScheduler::run`].
    pub fn schedule(&self, request: &ScheduleRequest) -> Result<ScheduleResult, ScheduleError> {
        Ok(self.run(request)?.into_result())
    }

    /// Runs the whole pipeline, returning the full trace with the result.
    ///
    /// # Errors
    /// See [`MatchScheduler::run`].
    pub fn schedule_with_trace(
        &self,
        request: &ScheduleRequest,
    ) -> Result<(ScheduleResult, Vec<TraceEvent>), ScheduleError> {
        let mut run = self.run(request)?;
        let trace: Vec<TraceEvent> = run.by_ref().collect();
        Ok((run.into_result(), trace))
    }
}
