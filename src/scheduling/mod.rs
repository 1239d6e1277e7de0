//! Doctor availability windows and the bookable time slots derived from them.
//!
//! A window is either weekly-recurring (a set of weekday indices) or pinned
//! to an explicit date range. Slots are fixed-duration segments of the
//! window span; booking a slot flips `is_booked` and cancelling unflags it,
//! so slots are never deleted by cancellation.

pub mod event_key;
pub mod form;
pub mod slots;

pub use event_key::EventKey;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum SchedulingError {
    #[error("end_time must be after start_time")]
    InvertedTimes,

    #[error("end_date must not precede start_date")]
    InvertedDates,

    #[error("recurring window needs at least one weekday")]
    EmptyWeekdaySet,

    #[error("weekday index out of range: {0}")]
    InvalidWeekday(u8),

    #[error("slot duration must be positive, got {0}")]
    InvalidDuration(i64),

    #[error("malformed event key: {0}")]
    MalformedEventKey(String),
}

/// When a window applies: weekly on a set of weekday indices (0 = Monday),
/// or an explicit inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recurrence {
    Weekly { days: Vec<u8> },
    Dated { start_date: NaiveDate, end_date: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub branch_id: Uuid,
    pub recurrence: Recurrence,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i64,
    pub is_active: bool,
}

impl AvailabilityWindow {
    /// Validate the window invariants. Overlap with other windows of the
    /// same doctor is deliberately not checked here.
    pub fn validate(&self) -> Result<(), SchedulingError> {
        if self.end_time <= self.start_time {
            return Err(SchedulingError::InvertedTimes);
        }
        if self.slot_duration_minutes <= 0 {
            return Err(SchedulingError::InvalidDuration(self.slot_duration_minutes));
        }
        match &self.recurrence {
            Recurrence::Weekly { days } => {
                if days.is_empty() {
                    return Err(SchedulingError::EmptyWeekdaySet);
                }
                if let Some(&bad) = days.iter().find(|&&d| d > 6) {
                    return Err(SchedulingError::InvalidWeekday(bad));
                }
            }
            Recurrence::Dated {
                start_date,
                end_date,
            } => {
                if end_date < start_date {
                    return Err(SchedulingError::InvertedDates);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: Uuid,
    pub availability_id: Uuid,
    pub slot_start: NaiveDateTime,
    pub slot_end: NaiveDateTime,
    /// `None` means derive from the span.
    pub duration_minutes: Option<i64>,
    pub is_booked: bool,
    pub is_active: bool,
}

impl TimeSlot {
    /// Stored duration when present, otherwise whole minutes of the span.
    pub fn effective_duration_minutes(&self) -> i64 {
        self.duration_minutes
            .unwrap_or_else(|| (self.slot_end - self.slot_start).num_minutes())
    }
}
