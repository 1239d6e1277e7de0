//! Slot generation: translate a window into concrete bookable segments.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use super::{AvailabilityWindow, Recurrence, SchedulingError, TimeSlot};

/// Divide one day's window span into fixed-duration segments.
/// A trailing partial segment is dropped.
pub fn segment_day(
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    duration_minutes: i64,
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let step = Duration::minutes(duration_minutes);
    let mut segments = Vec::new();
    let mut cursor = date.and_time(start_time);
    let end = date.and_time(end_time);
    while cursor + step <= end {
        segments.push((cursor, cursor + step));
        cursor += step;
    }
    segments
}

/// The concrete dates a window applies to, looking `horizon_days` ahead
/// from `from` (inclusive). Dated windows are clamped to their range.
pub fn expand_dates(recurrence: &Recurrence, from: NaiveDate, horizon_days: i64) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    match recurrence {
        Recurrence::Weekly { days } => {
            for offset in 0..horizon_days {
                let date = from + Duration::days(offset);
                let index = date.weekday().num_days_from_monday() as u8;
                if days.contains(&index) {
                    dates.push(date);
                }
            }
        }
        Recurrence::Dated {
            start_date,
            end_date,
        } => {
            let first = (*start_date).max(from);
            let last = (*end_date).min(from + Duration::days(horizon_days - 1));
            let mut date = first;
            while date <= last {
                dates.push(date);
                date += Duration::days(1);
            }
        }
    }
    dates
}

/// Generate the full slot set for a window over the horizon.
/// Slots inherit the window's `is_active` and start unbooked.
pub fn generate_slots(
    window: &AvailabilityWindow,
    from: NaiveDate,
    horizon_days: i64,
) -> Result<Vec<TimeSlot>, SchedulingError> {
    window.validate()?;

    let mut slots = Vec::new();
    for date in expand_dates(&window.recurrence, from, horizon_days) {
        for (slot_start, slot_end) in segment_day(
            date,
            window.start_time,
            window.end_time,
            window.slot_duration_minutes,
        ) {
            slots.push(TimeSlot {
                id: Uuid::new_v4(),
                availability_id: window.id,
                slot_start,
                slot_end,
                duration_minutes: Some(window.slot_duration_minutes),
                is_booked: false,
                is_active: window.is_active,
            });
        }
    }
    Ok(slots)
}
