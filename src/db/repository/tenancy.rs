//! Clinics, branches and doctors: the tenancy backbone.

use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;

#[derive(Debug, Clone)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Doctor {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub full_name: String,
    pub specialty: Option<String>,
}

pub fn insert_clinic(conn: &Connection, name: &str) -> Result<Clinic, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO clinics (id, name, created_at) VALUES (?1, ?2, ?3)",
        params![id.to_string(), name, Utc::now()],
    )?;
    Ok(Clinic {
        id,
        name: name.to_string(),
    })
}

pub fn get_clinic(conn: &Connection, id: &Uuid) -> Result<Clinic, DatabaseError> {
    conn.query_row(
        "SELECT id, name FROM clinics WHERE id = ?1",
        params![id.to_string()],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "Clinic".into(),
            id: id.to_string(),
        },
        other => DatabaseError::from(other),
    })
    .and_then(|(id, name)| {
        Ok(Clinic {
            id: parse_uuid("clinics.id", &id)?,
            name,
        })
    })
}

pub fn insert_branch(
    conn: &Connection,
    clinic_id: &Uuid,
    name: &str,
) -> Result<Branch, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO branches (id, clinic_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id.to_string(), clinic_id.to_string(), name, Utc::now()],
    )?;
    Ok(Branch {
        id,
        clinic_id: *clinic_id,
        name: name.to_string(),
    })
}

/// Branches of a clinic in creation order, the order the calendar's branch
/// selector preserves.
pub fn list_branches(conn: &Connection, clinic_id: &Uuid) -> Result<Vec<Branch>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic_id, name FROM branches WHERE clinic_id = ?1 ORDER BY created_at, id",
    )?;
    let rows = stmt.query_map(params![clinic_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut branches = Vec::new();
    for row in rows {
        let (id, clinic_id, name) = row?;
        branches.push(Branch {
            id: parse_uuid("branches.id", &id)?,
            clinic_id: parse_uuid("branches.clinic_id", &clinic_id)?,
            name,
        });
    }
    Ok(branches)
}

pub fn insert_doctor(
    conn: &Connection,
    clinic_id: &Uuid,
    branch_id: Option<&Uuid>,
    full_name: &str,
    specialty: Option<&str>,
) -> Result<Doctor, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO doctors (id, clinic_id, branch_id, full_name, specialty, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id.to_string(),
            clinic_id.to_string(),
            branch_id.map(Uuid::to_string),
            full_name,
            specialty,
            Utc::now(),
        ],
    )?;
    Ok(Doctor {
        id,
        clinic_id: *clinic_id,
        branch_id: branch_id.copied(),
        full_name: full_name.to_string(),
        specialty: specialty.map(str::to_string),
    })
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Doctor, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, clinic_id, branch_id, full_name, specialty
             FROM doctors WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                entity_type: "Doctor".into(),
                id: id.to_string(),
            },
            other => DatabaseError::from(other),
        })?;

    let (id, clinic_id, branch_id, full_name, specialty) = row;
    Ok(Doctor {
        id: parse_uuid("doctors.id", &id)?,
        clinic_id: parse_uuid("doctors.clinic_id", &clinic_id)?,
        branch_id: branch_id
            .map(|b| parse_uuid("doctors.branch_id", &b))
            .transpose()?,
        full_name,
        specialty,
    })
}
