use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::field::FieldKind;

/// Errors returned by the occurrence resolvers.
///
/// None of these are retried internally; the caller adjusts the schedule and
/// asks again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// A concrete field lies outside its calendar bound.
    #[error("Invalid {field}: {value} (expected {min}..={max})")]
    InvalidField {
        field: FieldKind,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Relative offsets did not move the schedule past `now`.
    #[error("Time is in the past: {at}")]
    PastTime { at: DateTime<Utc> },

    /// The carry search ran out of attempts.
    #[error("No valid upcoming date found matching the given conditions (after {attempts} attempts)")]
    UnresolvableSchedule { attempts: u32 },

    /// Date arithmetic left chrono's representable range.
    #[error("Time out of range: {0}")]
    OutOfRange(String),
}

impl SchedulerError {
    /// Short, stable code for each variant.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::InvalidField { .. } => "INVALID_FIELD",
            SchedulerError::PastTime { .. } => "PAST_TIME",
            SchedulerError::UnresolvableSchedule { .. } => "UNRESOLVABLE_SCHEDULE",
            SchedulerError::OutOfRange(_) => "OUT_OF_RANGE",
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
