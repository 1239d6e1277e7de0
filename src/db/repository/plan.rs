//! Plan catalog storage.

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::parse_uuid;
use crate::billing::{BillingCycle, Plan};
use crate::db::DatabaseError;

pub fn insert_plan(conn: &Connection, plan: &Plan) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO plans (id, name, billing_cycle, booking_limit, price_minor, is_trial)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            plan.id.to_string(),
            plan.name,
            plan.billing_cycle.as_str(),
            plan.booking_limit,
            plan.price_minor,
            plan.is_trial as i32,
        ],
    )?;
    Ok(())
}

pub fn get_plan(conn: &Connection, id: &Uuid) -> Result<Plan, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_PLAN} WHERE id = ?1"))?;
    let mut rows = stmt.query_map(params![id.to_string()], raw_plan_row)?;
    match rows.next() {
        Some(row) => plan_from_raw(row?),
        None => Err(DatabaseError::NotFound {
            entity_type: "Plan".into(),
            id: id.to_string(),
        }),
    }
}

/// Full catalog, cheapest first within the natural listing.
pub fn list_plans(conn: &Connection) -> Result<Vec<Plan>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_PLAN} ORDER BY booking_limit, name"))?;
    let rows = stmt.query_map([], raw_plan_row)?;
    let mut plans = Vec::new();
    for row in rows {
        plans.push(plan_from_raw(row?)?);
    }
    Ok(plans)
}

// ── Row mapping ──────────────────────────────────────────────────────────────

const SELECT_PLAN: &str =
    "SELECT id, name, billing_cycle, booking_limit, price_minor, is_trial FROM plans";

struct RawPlan {
    id: String,
    name: String,
    billing_cycle: String,
    booking_limit: i64,
    price_minor: i64,
    is_trial: bool,
}

fn raw_plan_row(row: &Row<'_>) -> rusqlite::Result<RawPlan> {
    Ok(RawPlan {
        id: row.get(0)?,
        name: row.get(1)?,
        billing_cycle: row.get(2)?,
        booking_limit: row.get(3)?,
        price_minor: row.get(4)?,
        is_trial: row.get(5)?,
    })
}

fn plan_from_raw(raw: RawPlan) -> Result<Plan, DatabaseError> {
    let billing_cycle = match raw.billing_cycle.as_str() {
        "monthly" => BillingCycle::Monthly,
        "yearly" => BillingCycle::Yearly,
        other => {
            return Err(DatabaseError::InvalidEnum {
                field: "plans.billing_cycle".into(),
                value: other.to_string(),
            })
        }
    };
    Ok(Plan {
        id: parse_uuid("plans.id", &raw.id)?,
        name: raw.name,
        billing_cycle,
        booking_limit: raw.booking_limit,
        price_minor: raw.price_minor,
        is_trial: raw.is_trial,
    })
}
