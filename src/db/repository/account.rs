//! Account storage. Role tags persist as a comma-separated marker list.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::parse_uuid;
use crate::auth::RoleSet;
use crate::db::DatabaseError;

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    /// PHC string; `None` means the password was never set.
    pub password_hash: Option<String>,
    pub roles: RoleSet,
    pub is_active: bool,
    pub clinic_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to create an account; the id is generated here.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub display_name: String,
    pub password_hash: Option<String>,
    pub roles: RoleSet,
    pub clinic_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
}

pub fn insert_account(conn: &Connection, new: &NewAccount) -> Result<Account, DatabaseError> {
    let id = Uuid::new_v4();
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO accounts (id, email, display_name, password_hash, roles, is_active,
         clinic_id, branch_id, doctor_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8, ?9)",
        params![
            id.to_string(),
            new.email,
            new.display_name,
            new.password_hash,
            new.roles.to_markers(),
            new.clinic_id.map(|v| v.to_string()),
            new.branch_id.map(|v| v.to_string()),
            new.doctor_id.map(|v| v.to_string()),
            created_at,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!("email already registered: {}", new.email))
        }
        other => DatabaseError::from(other),
    })?;

    Ok(Account {
        id,
        email: new.email.clone(),
        display_name: new.display_name.clone(),
        password_hash: new.password_hash.clone(),
        roles: new.roles.clone(),
        is_active: true,
        clinic_id: new.clinic_id,
        branch_id: new.branch_id,
        doctor_id: new.doctor_id,
        created_at,
    })
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<Account>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_ACCOUNT} WHERE email = ?1"))?;
    let mut rows = stmt.query_map(params![email], raw_account_row)?;
    match rows.next() {
        Some(row) => Ok(Some(account_from_raw(row?)?)),
        None => Ok(None),
    }
}

pub fn get_account(conn: &Connection, id: &Uuid) -> Result<Account, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_ACCOUNT} WHERE id = ?1"))?;
    let mut rows = stmt.query_map(params![id.to_string()], raw_account_row)?;
    match rows.next() {
        Some(row) => account_from_raw(row?),
        None => Err(DatabaseError::NotFound {
            entity_type: "Account".into(),
            id: id.to_string(),
        }),
    }
}

pub fn set_active(conn: &Connection, id: &Uuid, is_active: bool) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE accounts SET is_active = ?1 WHERE id = ?2",
        params![is_active as i32, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Account".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// ── Row mapping ──────────────────────────────────────────────────────────────

const SELECT_ACCOUNT: &str = "SELECT id, email, display_name, password_hash, roles, is_active,
     clinic_id, branch_id, doctor_id, created_at FROM accounts";

struct RawAccount {
    id: String,
    email: String,
    display_name: String,
    password_hash: Option<String>,
    roles: String,
    is_active: bool,
    clinic_id: Option<String>,
    branch_id: Option<String>,
    doctor_id: Option<String>,
    created_at: DateTime<Utc>,
}

fn raw_account_row(row: &Row<'_>) -> rusqlite::Result<RawAccount> {
    Ok(RawAccount {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        password_hash: row.get(3)?,
        roles: row.get(4)?,
        is_active: row.get(5)?,
        clinic_id: row.get(6)?,
        branch_id: row.get(7)?,
        doctor_id: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn account_from_raw(raw: RawAccount) -> Result<Account, DatabaseError> {
    Ok(Account {
        id: parse_uuid("accounts.id", &raw.id)?,
        email: raw.email,
        display_name: raw.display_name,
        password_hash: raw.password_hash,
        roles: RoleSet::from_markers(&raw.roles).map_err(|_| DatabaseError::InvalidEnum {
            field: "accounts.roles".into(),
            value: raw.roles,
        })?,
        is_active: raw.is_active,
        clinic_id: raw
            .clinic_id
            .map(|v| parse_uuid("accounts.clinic_id", &v))
            .transpose()?,
        branch_id: raw
            .branch_id
            .map(|v| parse_uuid("accounts.branch_id", &v))
            .transpose()?,
        doctor_id: raw
            .doctor_id
            .map(|v| parse_uuid("accounts.doctor_id", &v))
            .transpose()?,
        created_at: raw.created_at,
    })
}
