//! Clinic subscription endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, FreeTrialRequest, Principal, SubscribeRequest};
use crate::billing::{BillingCycle, Subscription, STATUS_SUCCESS, STATUS_SUPERSEDED};
use crate::db::repository::{plan, subscription, tenancy};
use crate::db::repository::subscription::NewSubscription;

fn cycle_expiry(cycle: BillingCycle) -> chrono::DateTime<Utc> {
    let days = match cycle {
        BillingCycle::Monthly => 30,
        BillingCycle::Yearly => 365,
    };
    Utc::now() + Duration::days(days)
}

fn resolve_clinic_id(principal: &Principal, requested: Option<Uuid>) -> Result<Uuid, ApiError> {
    match principal.account.clinic_id {
        Some(own) => Ok(own),
        None => requested.ok_or_else(|| ApiError::BadRequest("clinic_id is required".into())),
    }
}

/// `POST /clinic-subscriptions`: subscribe the clinic to a plan. The plan
/// must be selectable under the gating policy: with an active subscription
/// and remaining quota, only strictly higher-capacity plans are accepted.
pub async fn subscribe(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<Subscription>), ApiError> {
    let clinic_id = resolve_clinic_id(&principal, req.clinic_id)?;
    let conn = ctx.lock_db()?;
    tenancy::get_clinic(&conn, &clinic_id)?;
    let chosen = plan::get_plan(&conn, &req.plan_id)?;

    let now = Utc::now();
    let current = subscription::find_active(&conn, &clinic_id, now)?;
    if let Some(ref current) = current {
        let selectable = current.remaining_booking_limit == 0
            || (chosen.id != current.plan_id && chosen.booking_limit > current.booking_limit);
        if !selectable {
            return Err(ApiError::BadRequest(
                "plan is not selectable while the current subscription has remaining quota"
                    .into(),
            ));
        }
    }

    // Supersede and replace in one step so the clinic never holds two
    // active subscriptions.
    let tx = conn.unchecked_transaction()?;
    if let Some(current) = current {
        subscription::set_status(&conn, &current.id, STATUS_SUPERSEDED)?;
    }
    let created = subscription::insert_subscription(
        &conn,
        &NewSubscription {
            clinic_id,
            plan_id: chosen.id,
            booking_limit: chosen.booking_limit,
            expiry_date: cycle_expiry(chosen.billing_cycle),
            status: STATUS_SUCCESS.to_string(),
        },
    )?;
    tx.commit()?;
    tracing::info!(clinic_id = %clinic_id, plan = %chosen.name, "subscription created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /clinic-subscriptions/free-trial`: start a trial with an explicit
/// booking limit. Rejected when the clinic already has an active
/// subscription.
pub async fn free_trial(
    State(ctx): State<ApiContext>,
    Extension(_principal): Extension<Principal>,
    Json(req): Json<FreeTrialRequest>,
) -> Result<(StatusCode, Json<Subscription>), ApiError> {
    if req.booking_limit <= 0 {
        return Err(ApiError::BadRequest("booking_limit must be positive".into()));
    }
    let conn = ctx.lock_db()?;
    tenancy::get_clinic(&conn, &req.clinic_id)?;
    let chosen = plan::get_plan(&conn, &req.plan_id)?;

    let now = Utc::now();
    if subscription::find_active(&conn, &req.clinic_id, now)?.is_some() {
        return Err(ApiError::BadRequest(
            "clinic already has an active subscription".into(),
        ));
    }

    let created = subscription::insert_subscription(
        &conn,
        &NewSubscription {
            clinic_id: req.clinic_id,
            plan_id: chosen.id,
            booking_limit: req.booking_limit,
            expiry_date: cycle_expiry(chosen.billing_cycle),
            status: STATUS_SUCCESS.to_string(),
        },
    )?;
    tracing::info!(clinic_id = %req.clinic_id, plan = %chosen.name, "free trial started");
    Ok((StatusCode::CREATED, Json(created)))
}
