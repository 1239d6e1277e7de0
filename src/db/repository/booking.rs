//! Patient booking storage with append-only status history.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::parse_uuid;
use crate::booking::{Booking, BookingStatus, StatusHistoryEntry};
use crate::db::DatabaseError;

pub fn insert_booking(
    conn: &Connection,
    clinic_id: &Uuid,
    patient_full_detail: &serde_json::Value,
    shipping_address: Option<&str>,
    status: BookingStatus,
) -> Result<Booking, DatabaseError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO patient_bookings
         (id, clinic_id, patient_full_detail, shipping_address, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            id.to_string(),
            clinic_id.to_string(),
            patient_full_detail.to_string(),
            shipping_address,
            status.code(),
            now,
        ],
    )?;
    tx.execute(
        "INSERT INTO patient_booking_histories (booking_id, status, changed_by, changed_at)
         VALUES (?1, ?2, NULL, ?3)",
        params![id.to_string(), status.code(), now],
    )?;
    tx.commit()?;

    Ok(Booking {
        id,
        clinic_id: *clinic_id,
        patient_full_detail: patient_full_detail.clone(),
        shipping_address: shipping_address.map(str::to_string),
        status,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_booking(conn: &Connection, id: &Uuid) -> Result<Booking, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_BOOKING} WHERE id = ?1"))?;
    let mut rows = stmt.query_map(params![id.to_string()], raw_booking_row)?;
    match rows.next() {
        Some(row) => booking_from_raw(row?),
        None => Err(DatabaseError::NotFound {
            entity_type: "Booking".into(),
            id: id.to_string(),
        }),
    }
}

pub fn list_bookings(conn: &Connection, clinic_id: &Uuid) -> Result<Vec<Booking>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_BOOKING} WHERE clinic_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![clinic_id.to_string()], raw_booking_row)?;
    let mut bookings = Vec::new();
    for row in rows {
        bookings.push(booking_from_raw(row?)?);
    }
    Ok(bookings)
}

/// Apply an admin status change: update the current status and append the
/// history entry in one transaction.
pub fn change_status(
    conn: &Connection,
    id: &Uuid,
    new_status: BookingStatus,
    changed_by: Option<&str>,
) -> Result<Booking, DatabaseError> {
    let now = Utc::now();
    let tx = conn.unchecked_transaction()?;
    let changed = tx.execute(
        "UPDATE patient_bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![new_status.code(), now, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Booking".into(),
            id: id.to_string(),
        });
    }
    tx.execute(
        "INSERT INTO patient_booking_histories (booking_id, status, changed_by, changed_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![id.to_string(), new_status.code(), changed_by, now],
    )?;
    tx.commit()?;

    get_booking(conn, id)
}

/// The append-only history, oldest first.
pub fn list_history(
    conn: &Connection,
    booking_id: &Uuid,
) -> Result<Vec<StatusHistoryEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT status, changed_by, changed_at FROM patient_booking_histories
         WHERE booking_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![booking_id.to_string()], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, DateTime<Utc>>(2)?,
        ))
    })?;

    let mut history = Vec::new();
    for row in rows {
        let (code, changed_by, changed_at) = row?;
        history.push(StatusHistoryEntry {
            status: BookingStatus::from_code(code).map_err(|_| DatabaseError::InvalidEnum {
                field: "patient_booking_histories.status".into(),
                value: code.to_string(),
            })?,
            changed_by,
            changed_at,
        });
    }
    Ok(history)
}

// ── Row mapping ──────────────────────────────────────────────────────────────

const SELECT_BOOKING: &str = "SELECT id, clinic_id, patient_full_detail, shipping_address,
     status, created_at, updated_at FROM patient_bookings";

struct RawBooking {
    id: String,
    clinic_id: String,
    patient_full_detail: String,
    shipping_address: Option<String>,
    status: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn raw_booking_row(row: &Row<'_>) -> rusqlite::Result<RawBooking> {
    Ok(RawBooking {
        id: row.get(0)?,
        clinic_id: row.get(1)?,
        patient_full_detail: row.get(2)?,
        shipping_address: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn booking_from_raw(raw: RawBooking) -> Result<Booking, DatabaseError> {
    Ok(Booking {
        id: parse_uuid("patient_bookings.id", &raw.id)?,
        clinic_id: parse_uuid("patient_bookings.clinic_id", &raw.clinic_id)?,
        patient_full_detail: serde_json::from_str(&raw.patient_full_detail).map_err(|_| {
            DatabaseError::InvalidValue {
                field: "patient_bookings.patient_full_detail".into(),
                value: raw.patient_full_detail.clone(),
            }
        })?,
        shipping_address: raw.shipping_address,
        status: BookingStatus::from_code(raw.status).map_err(|_| DatabaseError::InvalidEnum {
            field: "patient_bookings.status".into(),
            value: raw.status.to_string(),
        })?,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}
