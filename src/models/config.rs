//! Scheduler configuration.

use serde::{Deserialize, Serialize};

use super::calendar::{generate_campaign_slots, CalendarError, DailySchedule, TimeSlot};

/// Default bound on negotiation rounds per phase.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Default number of rejections a vendor tolerates from one buyer
/// before it stops proposing there.
pub const DEFAULT_MAX_REJECTIONS_PER_PAIR: u32 = 2;

/// Event-level scheduling parameters.
///
/// Validated by [`validate_config`](crate::validation::validate_config)
/// before any phase runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// First event date (`YYYY-MM-DD`, inclusive).
    pub start_date: String,
    /// Last event date (`YYYY-MM-DD`, inclusive).
    pub end_date: String,
    /// Meeting windows per date.
    pub daily_schedules: Vec<DailySchedule>,
    /// Meetings every vendor must reach in Phase 1.
    pub min_meetings_per_vendor: usize,
    /// Upper bound on meetings per vendor after Phase 2.
    pub max_meetings_per_vendor: usize,
    /// Length of one meeting (minutes).
    pub meeting_duration_minutes: u32,
    /// Negotiation round cap per phase.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Rejections from the same buyer after which a vendor gives up on it.
    #[serde(default = "default_max_rejections_per_pair")]
    pub max_rejections_per_pair: u32,
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_max_rejections_per_pair() -> u32 {
    DEFAULT_MAX_REJECTIONS_PER_PAIR
}

impl SchedulerConfig {
    /// Creates a config for the date range with no windows.
    ///
    /// Defaults: min 1, max 1, 30-minute meetings.
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
            daily_schedules: Vec::new(),
            min_meetings_per_vendor: 1,
            max_meetings_per_vendor: 1,
            meeting_duration_minutes: 30,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_rejections_per_pair: DEFAULT_MAX_REJECTIONS_PER_PAIR,
        }
    }

    /// Adds the windows of one date.
    pub fn with_daily_schedule(mut self, schedule: DailySchedule) -> Self {
        self.daily_schedules.push(schedule);
        self
    }

    /// Sets the per-vendor meeting bounds.
    pub fn with_meetings_per_vendor(mut self, min: usize, max: usize) -> Self {
        self.min_meetings_per_vendor = min;
        self.max_meetings_per_vendor = max;
        self
    }

    /// Sets the meeting duration.
    pub fn with_meeting_duration(mut self, minutes: u32) -> Self {
        self.meeting_duration_minutes = minutes;
        self
    }

    /// Sets the negotiation round cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the per-pair rejection tolerance.
    pub fn with_max_rejections_per_pair(mut self, rejections: u32) -> Self {
        self.max_rejections_per_pair = rejections;
        self
    }

    /// All event dates that have a schedule, in order.
    pub fn campaign_dates(&self) -> Vec<String> {
        self.daily_schedules.iter().map(|d| d.date.clone()).collect()
    }

    /// Generates every bookable slot of the event.
    pub fn time_slots(&self) -> Result<Vec<TimeSlot>, CalendarError> {
        generate_campaign_slots(&self.daily_schedules, self.meeting_duration_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = SchedulerConfig::new("2025-01-15", "2025-01-16")
            .with_daily_schedule(DailySchedule::new("2025-01-15").with_window("09:00", "11:00"))
            .with_meetings_per_vendor(2, 4)
            .with_meeting_duration(20)
            .with_max_iterations(50);

        assert_eq!(config.min_meetings_per_vendor, 2);
        assert_eq!(config.max_meetings_per_vendor, 4);
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.campaign_dates(), vec!["2025-01-15".to_string()]);
        assert_eq!(config.time_slots().unwrap().len(), 6);
    }

    #[test]
    fn test_tuning_fields_default_on_deserialize() {
        let json = r#"{
            "start_date": "2025-01-15",
            "end_date": "2025-01-15",
            "daily_schedules": [{"date": "2025-01-15", "windows": [{"start": "09:00", "end": "10:00"}]}],
            "min_meetings_per_vendor": 1,
            "max_meetings_per_vendor": 2,
            "meeting_duration_minutes": 30
        }"#;
        let config: SchedulerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.max_rejections_per_pair, DEFAULT_MAX_REJECTIONS_PER_PAIR);
        assert_eq!(config.time_slots().unwrap().len(), 2);
    }
}
