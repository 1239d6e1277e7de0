//! Availability window and time-slot storage.
//!
//! Window edits are reconciled against booked slots: regeneration replaces
//! only unbooked slots, booked ones stay untouched. Cancellation unflags a
//! slot rather than deleting it.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::scheduling::{slots, AvailabilityWindow, Recurrence, TimeSlot};

/// Persist a window and materialize its slots over the horizon.
pub fn insert_window(
    conn: &Connection,
    window: &AvailabilityWindow,
    from: NaiveDate,
    horizon_days: i64,
) -> Result<Vec<TimeSlot>, DatabaseError> {
    let (days_of_week, start_date, end_date) = recurrence_columns(&window.recurrence);

    conn.execute(
        "INSERT INTO doctor_availabilities
         (id, doctor_id, branch_id, days_of_week, start_date, end_date,
          start_time, end_time, slot_duration_minutes, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            window.id.to_string(),
            window.doctor_id.to_string(),
            window.branch_id.to_string(),
            days_of_week,
            start_date,
            end_date,
            window.start_time,
            window.end_time,
            window.slot_duration_minutes,
            window.is_active as i32,
        ],
    )?;

    let generated = slots::generate_slots(window, from, horizon_days).map_err(|e| {
        DatabaseError::ConstraintViolation(format!("invalid availability window: {e}"))
    })?;
    insert_slots(conn, &generated)?;
    Ok(generated)
}

pub fn get_window(conn: &Connection, id: &Uuid) -> Result<AvailabilityWindow, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_WINDOW} WHERE id = ?1"))?;
    let mut rows = stmt.query_map(params![id.to_string()], raw_window_row)?;
    match rows.next() {
        Some(row) => window_from_raw(row?),
        None => Err(DatabaseError::NotFound {
            entity_type: "DoctorAvailability".into(),
            id: id.to_string(),
        }),
    }
}

pub fn list_windows_for_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<AvailabilityWindow>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_WINDOW} WHERE doctor_id = ?1 ORDER BY start_time"
    ))?;
    let rows = stmt.query_map(params![doctor_id.to_string()], raw_window_row)?;
    let mut windows = Vec::new();
    for row in rows {
        windows.push(window_from_raw(row?)?);
    }
    Ok(windows)
}

/// Apply a calendar drag/resize. The move contract re-activates the window
/// ("moved implies still intended to be available"), then regenerates the
/// unbooked slots for the new span.
pub fn move_window(
    conn: &Connection,
    id: &Uuid,
    new_start: NaiveDateTime,
    new_end: NaiveDateTime,
    from: NaiveDate,
    horizon_days: i64,
) -> Result<AvailabilityWindow, DatabaseError> {
    let mut window = get_window(conn, id)?;
    window.start_time = new_start.time();
    window.end_time = new_end.time();
    window.is_active = true;
    if let Recurrence::Dated { .. } = window.recurrence {
        // A dated window dragged to another day follows the drop date.
        window.recurrence = Recurrence::Dated {
            start_date: new_start.date(),
            end_date: new_end.date(),
        };
    }
    window.validate().map_err(|e| {
        DatabaseError::ConstraintViolation(format!("invalid availability window: {e}"))
    })?;

    let regenerated = slots::generate_slots(&window, from, horizon_days).map_err(|e| {
        DatabaseError::ConstraintViolation(format!("invalid availability window: {e}"))
    })?;

    let (days_of_week, start_date, end_date) = recurrence_columns(&window.recurrence);
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE doctor_availabilities
         SET days_of_week = ?1, start_date = ?2, end_date = ?3,
             start_time = ?4, end_time = ?5, is_active = 1
         WHERE id = ?6",
        params![
            days_of_week,
            start_date,
            end_date,
            window.start_time,
            window.end_time,
            id.to_string(),
        ],
    )?;
    tx.execute(
        "DELETE FROM doctor_time_slots WHERE availability_id = ?1 AND is_booked = 0",
        params![id.to_string()],
    )?;
    // Statements on the shared connection join the open transaction.
    insert_slots(conn, &regenerated)?;
    tx.commit()?;
    Ok(window)
}

pub fn deactivate_window(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctor_availabilities SET is_active = 0 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "DoctorAvailability".into(),
            id: id.to_string(),
        });
    }
    conn.execute(
        "UPDATE doctor_time_slots SET is_active = 0 WHERE availability_id = ?1 AND is_booked = 0",
        params![id.to_string()],
    )?;
    Ok(())
}

/// Advisory only: active windows of the same doctor whose time-of-day span
/// intersects the given one. Overlap is a data-quality concern this layer
/// surfaces but does not enforce.
pub fn find_time_overlaps(
    conn: &Connection,
    doctor_id: &Uuid,
    start_time: NaiveTime,
    end_time: NaiveTime,
    exclude: Option<&Uuid>,
) -> Result<Vec<Uuid>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id FROM doctor_availabilities
         WHERE doctor_id = ?1 AND is_active = 1
           AND start_time < ?2 AND end_time > ?3
           AND (?4 IS NULL OR id != ?4)",
    )?;
    let rows = stmt.query_map(
        params![
            doctor_id.to_string(),
            end_time,
            start_time,
            exclude.map(Uuid::to_string)
        ],
        |row| row.get::<_, String>(0),
    )?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(parse_uuid("doctor_availabilities.id", &row?)?);
    }
    Ok(ids)
}

// ── Slots ────────────────────────────────────────────────────────────────────

pub fn insert_slots(conn: &Connection, slots: &[TimeSlot]) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO doctor_time_slots
         (id, availability_id, slot_start, slot_end, duration_minutes, is_booked, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for slot in slots {
        stmt.execute(params![
            slot.id.to_string(),
            slot.availability_id.to_string(),
            slot.slot_start,
            slot.slot_end,
            slot.duration_minutes,
            slot.is_booked as i32,
            slot.is_active as i32,
        ])?;
    }
    Ok(())
}

pub fn list_slots(conn: &Connection, availability_id: &Uuid) -> Result<Vec<TimeSlot>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, availability_id, slot_start, slot_end, duration_minutes, is_booked, is_active
         FROM doctor_time_slots WHERE availability_id = ?1 ORDER BY slot_start",
    )?;
    let rows = stmt.query_map(params![availability_id.to_string()], raw_slot_row)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(slot_from_raw(row?)?);
    }
    Ok(result)
}

/// Flip a slot's booked flag. Cancelling unflags; the row survives.
pub fn set_slot_booked(conn: &Connection, slot_id: &Uuid, booked: bool) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctor_time_slots SET is_booked = ?1 WHERE id = ?2",
        params![booked as i32, slot_id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "DoctorTimeSlot".into(),
            id: slot_id.to_string(),
        });
    }
    Ok(())
}

// ── Row mapping ──────────────────────────────────────────────────────────────

const SELECT_WINDOW: &str = "SELECT id, doctor_id, branch_id, days_of_week, start_date, end_date,
     start_time, end_time, slot_duration_minutes, is_active FROM doctor_availabilities";

fn recurrence_columns(
    recurrence: &Recurrence,
) -> (Option<String>, Option<NaiveDate>, Option<NaiveDate>) {
    match recurrence {
        Recurrence::Weekly { days } => (
            Some(
                days.iter()
                    .map(u8::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            None,
            None,
        ),
        Recurrence::Dated {
            start_date,
            end_date,
        } => (None, Some(*start_date), Some(*end_date)),
    }
}

struct RawWindow {
    id: String,
    doctor_id: String,
    branch_id: String,
    days_of_week: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    start_time: NaiveTime,
    end_time: NaiveTime,
    slot_duration_minutes: i64,
    is_active: bool,
}

fn raw_window_row(row: &Row<'_>) -> rusqlite::Result<RawWindow> {
    Ok(RawWindow {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        branch_id: row.get(2)?,
        days_of_week: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        start_time: row.get(6)?,
        end_time: row.get(7)?,
        slot_duration_minutes: row.get(8)?,
        is_active: row.get(9)?,
    })
}

fn window_from_raw(raw: RawWindow) -> Result<AvailabilityWindow, DatabaseError> {
    let recurrence = match (raw.days_of_week, raw.start_date, raw.end_date) {
        (Some(days), _, _) => {
            let mut parsed = Vec::new();
            for part in days.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                parsed.push(part.parse::<u8>().map_err(|_| DatabaseError::InvalidValue {
                    field: "doctor_availabilities.days_of_week".into(),
                    value: days.clone(),
                })?);
            }
            Recurrence::Weekly { days: parsed }
        }
        (None, Some(start_date), Some(end_date)) => Recurrence::Dated {
            start_date,
            end_date,
        },
        (None, _, _) => {
            return Err(DatabaseError::InvalidValue {
                field: "doctor_availabilities.recurrence".into(),
                value: "neither days_of_week nor date range set".into(),
            })
        }
    };

    Ok(AvailabilityWindow {
        id: parse_uuid("doctor_availabilities.id", &raw.id)?,
        doctor_id: parse_uuid("doctor_availabilities.doctor_id", &raw.doctor_id)?,
        branch_id: parse_uuid("doctor_availabilities.branch_id", &raw.branch_id)?,
        recurrence,
        start_time: raw.start_time,
        end_time: raw.end_time,
        slot_duration_minutes: raw.slot_duration_minutes,
        is_active: raw.is_active,
    })
}

struct RawSlot {
    id: String,
    availability_id: String,
    slot_start: NaiveDateTime,
    slot_end: NaiveDateTime,
    duration_minutes: Option<i64>,
    is_booked: bool,
    is_active: bool,
}

fn raw_slot_row(row: &Row<'_>) -> rusqlite::Result<RawSlot> {
    Ok(RawSlot {
        id: row.get(0)?,
        availability_id: row.get(1)?,
        slot_start: row.get(2)?,
        slot_end: row.get(3)?,
        duration_minutes: row.get(4)?,
        is_booked: row.get(5)?,
        is_active: row.get(6)?,
    })
}

fn slot_from_raw(raw: RawSlot) -> Result<TimeSlot, DatabaseError> {
    Ok(TimeSlot {
        id: parse_uuid("doctor_time_slots.id", &raw.id)?,
        availability_id: parse_uuid("doctor_time_slots.availability_id", &raw.availability_id)?,
        slot_start: raw.slot_start,
        slot_end: raw.slot_end,
        duration_minutes: raw.duration_minutes,
        is_booked: raw.is_booked,
        is_active: raw.is_active,
    })
}
