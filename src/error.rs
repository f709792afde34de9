//! Top-level scheduling errors.
//!
//! Only malformed input is an error. A run that cannot satisfy every
//! vendor minimum still returns a [`ScheduleResult`](crate::models::ScheduleResult)
//! with `success == false`.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors returned before any negotiation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// The scheduler configuration is inconsistent.
    #[error("invalid configuration: {}", join_messages(.0))]
    InvalidConfig(Vec<ValidationError>),
    /// The vendor or buyer lists are unusable.
    #[error("invalid input: {}", join_messages(.0))]
    InvalidInput(Vec<ValidationError>),
}

impl ScheduleError {
    /// The individual validation failures.
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ScheduleError::InvalidConfig(errors) | ScheduleError::InvalidInput(errors) => errors,
        }
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
