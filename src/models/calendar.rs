//! Event calendar: daily time windows and bookable time slots.
//!
//! # Time Model
//! Dates are `YYYY-MM-DD` strings and times are `HH:MM` strings, as
//! supplied by the data layer. They are parsed with `chrono` only when slots
//! are generated or validated.
//!
//! A window `[start, end)` on a date is cut into back-to-back slots of the
//! meeting duration. A trailing remainder shorter than the duration is
//! dropped: `09:00-10:45` with 30-minute meetings yields 09:00, 09:30, 10:00.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A daily availability window `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window start (`HH:MM`, inclusive).
    pub start: String,
    /// Window end (`HH:MM`, exclusive).
    pub end: String,
}

/// The windows open for meetings on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySchedule {
    /// Date (`YYYY-MM-DD`).
    pub date: String,
    /// Meeting windows on this date.
    pub windows: Vec<TimeWindow>,
}

/// A discrete bookable interval.
///
/// Ordered chronologically (by `datetime`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Slot start (`YYYY-MM-DDTHH:MM:SS`). Unique per slot.
    pub datetime: String,
    /// Date portion (`YYYY-MM-DD`).
    pub date: String,
    /// Time portion (`HH:MM`).
    pub time: String,
}

/// Calendar parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// Date string is not `YYYY-MM-DD`.
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
    /// Time string is not `HH:MM`.
    #[error("invalid time '{0}' (expected HH:MM)")]
    InvalidTime(String),
    /// Window end is not after its start.
    #[error("window {start}-{end} on {date} is empty")]
    EmptyWindow {
        date: String,
        start: String,
        end: String,
    },
    /// Meeting duration is zero.
    #[error("meeting duration must be positive")]
    ZeroDuration,
}

impl TimeWindow {
    /// Creates a window.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Parses the window bounds.
    pub fn parse(&self) -> Result<(NaiveTime, NaiveTime), CalendarError> {
        Ok((parse_time(&self.start)?, parse_time(&self.end)?))
    }

    /// Window length in minutes. Errors on unparsable bounds.
    pub fn duration_minutes(&self) -> Result<i64, CalendarError> {
        let (start, end) = self.parse()?;
        Ok((end - start).num_minutes())
    }
}

impl DailySchedule {
    /// Creates a schedule for a date with no windows.
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            windows: Vec::new(),
        }
    }

    /// Adds a window.
    pub fn with_window(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.windows.push(TimeWindow::new(start, end));
        self
    }

    /// Generates all slots for this date, window by window.
    pub fn slots(&self, duration_minutes: u32) -> Result<Vec<TimeSlot>, CalendarError> {
        let mut slots = Vec::new();
        for window in &self.windows {
            slots.extend(generate_slots_from_window(
                &self.date,
                window,
                duration_minutes,
            )?);
        }
        Ok(slots)
    }
}

impl TimeSlot {
    /// Builds a slot from a start timestamp.
    pub fn at(start: NaiveDateTime) -> Self {
        Self {
            datetime: start.format(DATETIME_FORMAT).to_string(),
            date: start.format(DATE_FORMAT).to_string(),
            time: start.format(TIME_FORMAT).to_string(),
        }
    }

    /// Builds a slot from date and time strings.
    pub fn parse(date: &str, time: &str) -> Result<Self, CalendarError> {
        let date = parse_date(date)?;
        let time = parse_time(time)?;
        Ok(Self::at(date.and_time(time)))
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| CalendarError::InvalidDate(s.into()))
}

/// Parses an `HH:MM` (or `HH:MM:SS`) time.
pub fn parse_time(s: &str) -> Result<NaiveTime, CalendarError> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| CalendarError::InvalidTime(s.into()))
}

/// Cuts one window into back-to-back slots of `duration_minutes`.
///
/// # Example
/// ```
/// use u_meeting::models::{generate_slots_from_window, TimeWindow};
///
/// let slots = generate_slots_from_window("2025-01-15", &TimeWindow::new("09:00", "10:00"), 30)
///     .unwrap();
/// let times: Vec<_> = slots.iter().map(|s| s.time.as_str()).collect();
/// assert_eq!(times, vec!["09:00", "09:30"]);
/// ```
pub fn generate_slots_from_window(
    date: &str,
    window: &TimeWindow,
    duration_minutes: u32,
) -> Result<Vec<TimeSlot>, CalendarError> {
    if duration_minutes == 0 {
        return Err(CalendarError::ZeroDuration);
    }
    let day = parse_date(date)?;
    let (start, end) = window.parse()?;
    if end <= start {
        return Err(CalendarError::EmptyWindow {
            date: date.into(),
            start: window.start.clone(),
            end: window.end.clone(),
        });
    }

    let step = Duration::minutes(i64::from(duration_minutes));
    let end = day.and_time(end);
    let mut current = day.and_time(start);
    let mut slots = Vec::new();

    while current + step <= end {
        slots.push(TimeSlot::at(current));
        current += step;
    }

    Ok(slots)
}

/// Generates every slot of the event, in schedule then window order.
pub fn generate_campaign_slots(
    schedules: &[DailySchedule],
    duration_minutes: u32,
) -> Result<Vec<TimeSlot>, CalendarError> {
    let mut slots = Vec::new();
    for schedule in schedules {
        slots.extend(schedule.slots(duration_minutes)?);
    }
    Ok(slots)
}

/// Keeps the slots falling on one of `dates`, preserving order.
pub fn filter_slots_by_dates<'a>(
    slots: &'a [TimeSlot],
    dates: &[String],
) -> impl Iterator<Item = &'a TimeSlot> + 'a {
    let dates: std::collections::HashSet<String> = dates.iter().cloned().collect();
    slots.iter().filter(move |s| dates.contains(&s.date))
}
