//! Clinic subscription storage.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::parse_uuid;
use crate::billing::{Subscription, STATUS_SUCCESS};
use crate::db::DatabaseError;

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub clinic_id: Uuid,
    pub plan_id: Uuid,
    pub booking_limit: i64,
    pub expiry_date: DateTime<Utc>,
    pub status: String,
}

pub fn insert_subscription(
    conn: &Connection,
    new: &NewSubscription,
) -> Result<Subscription, DatabaseError> {
    let id = Uuid::new_v4();
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO clinic_subscriptions
         (id, clinic_id, plan_id, booking_limit, remaining_booking_limit,
          expiry_date, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6, ?7)",
        params![
            id.to_string(),
            new.clinic_id.to_string(),
            new.plan_id.to_string(),
            new.booking_limit,
            new.expiry_date,
            new.status,
            created_at,
        ],
    )?;
    Ok(Subscription {
        id,
        clinic_id: new.clinic_id,
        plan_id: new.plan_id,
        booking_limit: new.booking_limit,
        remaining_booking_limit: new.booking_limit,
        expiry_date: new.expiry_date,
        status: new.status.clone(),
        created_at,
    })
}

/// The clinic's active subscription, if any: `status = success` and
/// unexpired. There is at most one; the newest wins if data drifts.
pub fn find_active(
    conn: &Connection,
    clinic_id: &Uuid,
    now: DateTime<Utc>,
) -> Result<Option<Subscription>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_SUBSCRIPTION}
         WHERE clinic_id = ?1 AND status = ?2 AND expiry_date > ?3
         ORDER BY created_at DESC LIMIT 1"
    ))?;
    let mut rows = stmt.query_map(
        params![clinic_id.to_string(), STATUS_SUCCESS, now],
        raw_subscription_row,
    )?;
    match rows.next() {
        Some(row) => Ok(Some(subscription_from_raw(row?)?)),
        None => Ok(None),
    }
}

pub fn set_status(conn: &Connection, id: &Uuid, status: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE clinic_subscriptions SET status = ?1 WHERE id = ?2",
        params![status, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ClinicSubscription".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// ── Row mapping ──────────────────────────────────────────────────────────────

const SELECT_SUBSCRIPTION: &str = "SELECT id, clinic_id, plan_id, booking_limit,
     remaining_booking_limit, expiry_date, status, created_at FROM clinic_subscriptions";

struct RawSubscription {
    id: String,
    clinic_id: String,
    plan_id: String,
    booking_limit: i64,
    remaining_booking_limit: i64,
    expiry_date: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
}

fn raw_subscription_row(row: &Row<'_>) -> rusqlite::Result<RawSubscription> {
    Ok(RawSubscription {
        id: row.get(0)?,
        clinic_id: row.get(1)?,
        plan_id: row.get(2)?,
        booking_limit: row.get(3)?,
        remaining_booking_limit: row.get(4)?,
        expiry_date: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn subscription_from_raw(raw: RawSubscription) -> Result<Subscription, DatabaseError> {
    Ok(Subscription {
        id: parse_uuid("clinic_subscriptions.id", &raw.id)?,
        clinic_id: parse_uuid("clinic_subscriptions.clinic_id", &raw.clinic_id)?,
        plan_id: parse_uuid("clinic_subscriptions.plan_id", &raw.plan_id)?,
        booking_limit: raw.booking_limit,
        remaining_booking_limit: raw.remaining_booking_limit,
        expiry_date: raw.expiry_date,
        status: raw.status,
        created_at: raw.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::billing::{BillingCycle, Plan, STATUS_SUPERSEDED};
    use crate::db::open_memory_database;
    use crate::db::repository::{plan, tenancy};

    fn seed(conn: &Connection) -> (Uuid, Uuid) {
        let clinic = tenancy::insert_clinic(conn, "Main").unwrap();
        let p = Plan {
            id: Uuid::new_v4(),
            name: "Standard".into(),
            billing_cycle: BillingCycle::Monthly,
            booking_limit: 50,
            price_minor: 5000,
            is_trial: false,
        };
        plan::insert_plan(conn, &p).unwrap();
        (clinic.id, p.id)
    }

    fn new_sub(clinic_id: Uuid, plan_id: Uuid, status: &str, days: i64) -> NewSubscription {
        NewSubscription {
            clinic_id,
            plan_id,
            booking_limit: 50,
            expiry_date: Utc::now() + Duration::days(days),
            status: status.into(),
        }
    }

    #[test]
    fn active_lookup_requires_success_and_unexpired() {
        let conn = open_memory_database().unwrap();
        let (clinic_id, plan_id) = seed(&conn);

        insert_subscription(&conn, &new_sub(clinic_id, plan_id, "pending", 30)).unwrap();
        assert!(find_active(&conn, &clinic_id, Utc::now()).unwrap().is_none());

        insert_subscription(&conn, &new_sub(clinic_id, plan_id, STATUS_SUCCESS, -1)).unwrap();
        assert!(find_active(&conn, &clinic_id, Utc::now()).unwrap().is_none());

        let live =
            insert_subscription(&conn, &new_sub(clinic_id, plan_id, STATUS_SUCCESS, 30)).unwrap();
        let found = find_active(&conn, &clinic_id, Utc::now()).unwrap().unwrap();
        assert_eq!(found.id, live.id);
        assert_eq!(found.remaining_booking_limit, 50);
    }

    #[test]
    fn superseded_subscription_stops_being_active() {
        let conn = open_memory_database().unwrap();
        let (clinic_id, plan_id) = seed(&conn);
        let created =
            insert_subscription(&conn, &new_sub(clinic_id, plan_id, STATUS_SUCCESS, 30)).unwrap();
        assert!(find_active(&conn, &clinic_id, Utc::now()).unwrap().is_some());

        set_status(&conn, &created.id, STATUS_SUPERSEDED).unwrap();
        assert!(find_active(&conn, &clinic_id, Utc::now()).unwrap().is_none());

        let missing = set_status(&conn, &Uuid::new_v4(), STATUS_SUPERSEDED);
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }
}
