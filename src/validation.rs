//! Input validation for meeting-scheduling problems.
//!
//! Checks structural integrity of the configuration and the participant
//! lists before any phase runs. Detects:
//! - Inconsistent meeting bounds (min > max, max = 0)
//! - Zero meeting duration, iteration cap, or rejection limit
//! - Unparsable dates and times, inverted date ranges
//! - Empty or inverted daily windows, schedule dates outside the range
//! - Duplicate time slots
//! - Missing participants, duplicate or empty IDs
//!
//! All checks run; every problem found is reported, not just the first.

use std::collections::HashSet;

use crate::models::calendar::{parse_date, parse_time};
use crate::models::{Buyer, CalendarError, SchedulerConfig, TimeSlot, Vendor};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// `min_meetings_per_vendor > max_meetings_per_vendor`, or max is 0.
    InvalidMeetingBounds,
    /// Meeting duration is 0.
    ZeroDuration,
    /// `max_iterations` is 0.
    InvalidIterationLimit,
    /// `max_rejections_per_pair` is 0.
    InvalidRejectionLimit,
    /// A date is not `YYYY-MM-DD`.
    InvalidDate,
    /// A time is not `HH:MM`.
    InvalidTime,
    /// `start_date` is after `end_date`.
    InvalidDateRange,
    /// A daily schedule falls outside `[start_date, end_date]`.
    DateOutOfRange,
    /// A window ends at or before its start.
    EmptyWindow,
    /// Two slots share the same start.
    DuplicateTimeSlot,
    /// No vendors supplied.
    NoVendors,
    /// No buyers supplied.
    NoBuyers,
    /// Two participants share the same ID.
    DuplicateId,
    /// A participant has an empty ID.
    EmptyId,
}

impl ValidationError {
    /// Creates an error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<CalendarError> for ValidationError {
    fn from(err: CalendarError) -> Self {
        let kind = match err {
            CalendarError::InvalidDate(_) => ValidationErrorKind::InvalidDate,
            CalendarError::InvalidTime(_) => ValidationErrorKind::InvalidTime,
            CalendarError::EmptyWindow { .. } => ValidationErrorKind::EmptyWindow,
            CalendarError::ZeroDuration => ValidationErrorKind::ZeroDuration,
        };
        Self::new(kind, err.to_string())
    }
}

/// Validates a scheduler configuration.
///
/// Checks:
/// 1. `0 < max_meetings_per_vendor` and `min <= max`
/// 2. Positive meeting duration, iteration cap, and rejection limit
/// 3. Start and end dates parse, start <= end
/// 4. Every daily schedule date parses and lies within the range
/// 5. Every window parses and is non-empty
/// 6. Generated slots are unique
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_config(config: &SchedulerConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.max_meetings_per_vendor == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidMeetingBounds,
            "max_meetings_per_vendor must be positive",
        ));
    }
    if config.min_meetings_per_vendor > config.max_meetings_per_vendor {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidMeetingBounds,
            format!(
                "min_meetings_per_vendor ({}) exceeds max_meetings_per_vendor ({})",
                config.min_meetings_per_vendor, config.max_meetings_per_vendor
            ),
        ));
    }
    if config.meeting_duration_minutes == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::ZeroDuration,
            "meeting_duration_minutes must be positive",
        ));
    }
    if config.max_iterations == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidIterationLimit,
            "max_iterations must be positive",
        ));
    }
    if config.max_rejections_per_pair == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidRejectionLimit,
            "max_rejections_per_pair must be positive",
        ));
    }

    // Date range
    let start = parse_date(&config.start_date).map_err(|e| {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidDate,
            format!("start_date: {e}"),
        ))
    });
    let end = parse_date(&config.end_date).map_err(|e| {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidDate,
            format!("end_date: {e}"),
        ))
    });
    let range = match (start, end) {
        (Ok(start), Ok(end)) if start > end => {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDateRange,
                format!(
                    "start_date {} is after end_date {}",
                    config.start_date, config.end_date
                ),
            ));
            None
        }
        (Ok(start), Ok(end)) => Some((start, end)),
        _ => None,
    };

    // Daily schedules
    let mut calendar_ok = true;
    for schedule in &config.daily_schedules {
        match parse_date(&schedule.date) {
            Ok(date) => {
                if let Some((start, end)) = range {
                    if date < start || date > end {
                        errors.push(ValidationError::new(
                            ValidationErrorKind::DateOutOfRange,
                            format!(
                                "schedule date {} is outside {}..={}",
                                schedule.date, config.start_date, config.end_date
                            ),
                        ));
                    }
                }
            }
            Err(e) => {
                calendar_ok = false;
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidDate,
                    format!("daily schedule: {e}"),
                ));
            }
        }

        for window in &schedule.windows {
            match (parse_time(&window.start), parse_time(&window.end)) {
                (Ok(from), Ok(to)) => {
                    if to <= from {
                        calendar_ok = false;
                        errors.push(ValidationError::new(
                            ValidationErrorKind::EmptyWindow,
                            format!(
                                "window {}-{} on {} is empty",
                                window.start, window.end, schedule.date
                            ),
                        ));
                    }
                }
                (from, to) => {
                    calendar_ok = false;
                    for bad in [from.err(), to.err()].into_iter().flatten() {
                        errors.push(ValidationError::new(
                            ValidationErrorKind::InvalidTime,
                            format!("window on {}: {bad}", schedule.date),
                        ));
                    }
                }
            }
        }
    }

    // Slot uniqueness (only meaningful once the calendar itself is sound)
    if calendar_ok && config.meeting_duration_minutes > 0 {
        if let Ok(slots) = config.time_slots() {
            if let Err(mut dup) = validate_time_slots(&slots) {
                errors.append(&mut dup);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that no two slots start at the same instant.
pub fn validate_time_slots(slots: &[TimeSlot]) -> ValidationResult {
    let mut seen = HashSet::new();
    let errors: Vec<ValidationError> = slots
        .iter()
        .filter(|s| !seen.insert(s.datetime.as_str()))
        .map(|s| {
            ValidationError::new(
                ValidationErrorKind::DuplicateTimeSlot,
                format!("Duplicate time slot: {}", s.datetime),
            )
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the participant lists.
///
/// Checks:
/// 1. At least one vendor and one buyer
/// 2. No empty IDs
/// 3. No duplicate vendor IDs, no duplicate buyer IDs
/// 4. Every availability date parses
pub fn validate_input(vendors: &[Vendor], buyers: &[Buyer]) -> ValidationResult {
    let mut errors = Vec::new();

    if vendors.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoVendors,
            "at least one vendor is required",
        ));
    }
    if buyers.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoBuyers,
            "at least one buyer is required",
        ));
    }

    let mut vendor_ids = HashSet::new();
    for v in vendors {
        check_id("vendor", &v.id, &mut vendor_ids, &mut errors);
        check_dates("vendor", &v.id, &v.available_dates, &mut errors);
    }

    let mut buyer_ids = HashSet::new();
    for b in buyers {
        check_id("buyer", &b.id, &mut buyer_ids, &mut errors);
        check_dates("buyer", &b.id, &b.available_dates, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_id<'a>(
    role: &str,
    id: &'a str,
    seen: &mut HashSet<&'a str>,
    errors: &mut Vec<ValidationError>,
) {
    if id.trim().is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyId,
            format!("A {role} has an empty ID"),
        ));
    } else if !seen.insert(id) {
        errors.push(ValidationError::new(
            ValidationErrorKind::DuplicateId,
            format!("Duplicate {role} ID: {id}"),
        ));
    }
}

fn check_dates(role: &str, id: &str, dates: &[String], errors: &mut Vec<ValidationError>) {
    for date in dates {
        if let Err(e) = parse_date(date) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDate,
                format!("{role} '{id}': {e}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailySchedule;

    fn valid_config() -> SchedulerConfig {
        SchedulerConfig::new("2025-01-15", "2025-01-16")
            .with_daily_schedule(DailySchedule::new("2025-01-15").with_window("09:00", "11:00"))
            .with_meetings_per_vendor(1, 3)
    }

    fn kinds(errors: &[ValidationError]) -> Vec<ValidationErrorKind> {
        errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_min_exceeds_max() {
        let config = valid_config().with_meetings_per_vendor(4, 2);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidMeetingBounds]);
        assert!(errors[0].message.contains("(4)"));
    }

    #[test]
    fn test_zero_max_and_duration() {
        let config = valid_config()
            .with_meetings_per_vendor(0, 0)
            .with_meeting_duration(0)
            .with_max_iterations(0)
            .with_max_rejections_per_pair(0);
        let errors = validate_config(&config).unwrap_err();
        let k = kinds(&errors);
        assert!(k.contains(&ValidationErrorKind::InvalidRejectionLimit));
        assert!(k.contains(&ValidationErrorKind::InvalidMeetingBounds));
        assert!(k.contains(&ValidationErrorKind::ZeroDuration));
        assert!(k.contains(&ValidationErrorKind::InvalidIterationLimit));
    }

    #[test]
    fn test_bad_dates() {
        let mut config = valid_config();
        config.start_date = "15/01/2025".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidDate]);

        let mut config = valid_config();
        config.start_date = "2025-01-20".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidDateRange]);
    }

    #[test]
    fn test_schedule_outside_range() {
        let config = valid_config()
            .with_daily_schedule(DailySchedule::new("2025-02-01").with_window("09:00", "10:00"));
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::DateOutOfRange]);
    }

    #[test]
    fn test_bad_windows() {
        let config = valid_config()
            .with_daily_schedule(
                DailySchedule::new("2025-01-16")
                    .with_window("12:00", "12:00")
                    .with_window("noon", "13:00"),
            );
        let errors = validate_config(&config).unwrap_err();
        let k = kinds(&errors);
        assert!(k.contains(&ValidationErrorKind::EmptyWindow));
        assert!(k.contains(&ValidationErrorKind::InvalidTime));
    }

    #[test]
    fn test_overlapping_windows_duplicate_slots() {
        let config = valid_config().with_daily_schedule(
            DailySchedule::new("2025-01-16")
                .with_window("09:00", "10:00")
                .with_window("09:30", "10:30"),
        );
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::DuplicateTimeSlot]);
        assert!(errors[0].message.contains("2025-01-16T09:30:00"));
    }

    #[test]
    fn test_valid_input() {
        let vendors = vec![Vendor::new("V1"), Vendor::new("V2")];
        let buyers = vec![Buyer::new("B1").with_available_date("2025-01-15")];
        assert!(validate_input(&vendors, &buyers).is_ok());
    }

    #[test]
    fn test_missing_participants() {
        let errors = validate_input(&[], &[]).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![ValidationErrorKind::NoVendors, ValidationErrorKind::NoBuyers]
        );
    }

    #[test]
    fn test_duplicate_and_empty_ids() {
        let vendors = vec![Vendor::new("V1"), Vendor::new("V1"), Vendor::new(" ")];
        let buyers = vec![Buyer::new("B1")];
        let errors = validate_input(&vendors, &buyers).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("vendor")));
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::EmptyId));
    }

    #[test]
    fn test_same_id_on_both_sides_is_allowed() {
        let vendors = vec![Vendor::new("X")];
        let buyers = vec![Buyer::new("X")];
        assert!(validate_input(&vendors, &buyers).is_ok());
    }

    #[test]
    fn test_bad_availability_date() {
        let vendors = vec![Vendor::new("V1").with_available_date("Jan 15")];
        let buyers = vec![Buyer::new("B1")];
        let errors = validate_input(&vendors, &buyers).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidDate]);
    }

    #[test]
    fn test_calendar_error_maps_to_kind() {
        let err: ValidationError = CalendarError::InvalidTime("9am".into()).into();
        assert_eq!(err.kind, ValidationErrorKind::InvalidTime);
        assert!(err.message.contains("9am"));
    }
}
