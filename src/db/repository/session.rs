//! Server-side session rows, keyed by token hash.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_uuid;
use crate::auth::Role;
use crate::db::DatabaseError;

#[derive(Debug, Clone)]
pub struct SessionRow {
    pub token_hash: String,
    pub account_id: Uuid,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub fn insert_session(conn: &Connection, session: &SessionRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, account_id, role, issued_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            session.token_hash,
            session.account_id.to_string(),
            session.role.marker(),
            session.issued_at,
            session.expires_at,
        ],
    )?;
    Ok(())
}

/// Look up a session by token hash, returning `None` when absent or expired.
pub fn find_valid_session(
    conn: &Connection,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<SessionRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT token_hash, account_id, role, issued_at, expires_at
         FROM sessions WHERE token_hash = ?1",
    )?;
    let mut rows = stmt.query_map(params![token_hash], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, DateTime<Utc>>(3)?,
            row.get::<_, DateTime<Utc>>(4)?,
        ))
    })?;

    let Some(row) = rows.next() else {
        return Ok(None);
    };
    let (token_hash, account_id, role, issued_at, expires_at) = row?;

    if expires_at <= now {
        return Ok(None);
    }

    Ok(Some(SessionRow {
        token_hash,
        account_id: parse_uuid("sessions.account_id", &account_id)?,
        role: Role::from_marker(&role).map_err(|_| DatabaseError::InvalidEnum {
            field: "sessions.role".into(),
            value: role,
        })?,
        issued_at,
        expires_at,
    }))
}

/// Delete a session row. Deleting an unknown token is a no-op so that
/// logout stays idempotent.
pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM sessions WHERE token_hash = ?1", params![token_hash])?;
    Ok(())
}

/// Drop every expired session row; returns how many were removed.
pub fn purge_expired(conn: &Connection, now: DateTime<Utc>) -> Result<usize, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![now],
    )?;
    Ok(removed)
}
