//! Calendar form seeding and branch-option ordering for the availability
//! editor.

use chrono::{Datelike, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AvailabilityWindow, Recurrence, TimeSlot};
use crate::db::repository::tenancy::Branch;

/// The range a user dragged out on the calendar when creating a window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectedRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Display model backing the availability editor form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormModel {
    pub availability_id: Option<Uuid>,
    pub days_of_week: Vec<u8>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i64,
    pub is_active: bool,
    pub slots: Vec<SlotDisplay>,
}

/// One persisted slot as shown in the edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDisplay {
    pub slot_id: Uuid,
    pub slot_start: NaiveDateTime,
    pub slot_end: NaiveDateTime,
    pub duration_minutes: i64,
    pub is_booked: bool,
}

/// Seed the editor form.
///
/// Creating: day-of-week and time bounds come from the picked range.
/// Editing: the persisted window and its slots are mapped into display
/// entries, deriving each duration from the span when not stored.
pub fn derive_defaults(
    selected: Option<SelectedRange>,
    existing: Option<(&AvailabilityWindow, &[TimeSlot])>,
) -> FormModel {
    if let Some((window, slots)) = existing {
        let days_of_week = match &window.recurrence {
            Recurrence::Weekly { days } => days.clone(),
            Recurrence::Dated { start_date, .. } => {
                vec![start_date.weekday().num_days_from_monday() as u8]
            }
        };
        return FormModel {
            availability_id: Some(window.id),
            days_of_week,
            start_time: window.start_time,
            end_time: window.end_time,
            slot_duration_minutes: window.slot_duration_minutes,
            is_active: window.is_active,
            slots: slots
                .iter()
                .map(|s| SlotDisplay {
                    slot_id: s.id,
                    slot_start: s.slot_start,
                    slot_end: s.slot_end,
                    duration_minutes: s.effective_duration_minutes(),
                    is_booked: s.is_booked,
                })
                .collect(),
        };
    }

    let (days_of_week, start_time, end_time) = match selected {
        Some(range) => (
            vec![range.start.date().weekday().num_days_from_monday() as u8],
            range.start.time(),
            range.end.time(),
        ),
        None => (
            Vec::new(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
        ),
    };

    FormModel {
        availability_id: None,
        days_of_week,
        start_time,
        end_time,
        slot_duration_minutes: crate::config::DEFAULT_SLOT_MINUTES,
        is_active: true,
        slots: Vec::new(),
    }
}

/// The branch tied to the event being edited surfaces first; all other
/// branches keep their original relative order. This ordering is a
/// usability contract, not cosmetic.
pub fn reorder_branch_options(current_branch: &Uuid, all_branches: &[Branch]) -> Vec<Branch> {
    let mut ordered = Vec::with_capacity(all_branches.len());
    ordered.extend(all_branches.iter().filter(|b| b.id == *current_branch).cloned());
    ordered.extend(all_branches.iter().filter(|b| b.id != *current_branch).cloned());
    ordered
}
