//! Doctor availability endpoints: create, list, form seeding, move,
//! deactivate, slots.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{
    ApiContext, AvailabilityResponse, CreateAvailabilityRequest, MoveAvailabilityRequest,
    Principal,
};
use crate::auth::Role;
use crate::config::{DEFAULT_SLOT_MINUTES, SLOT_HORIZON_DAYS};
use crate::db::repository::availability;
use crate::db::repository::tenancy::{self, Branch};
use crate::scheduling::form::{self, FormModel, SelectedRange};
use crate::scheduling::{AvailabilityWindow, TimeSlot};

/// A doctor session always operates on its own calendar; clinic and branch
/// sessions must name the doctor explicitly.
fn resolve_doctor_id(principal: &Principal, requested: Option<Uuid>) -> Result<Uuid, ApiError> {
    if principal.role == Role::Doctor {
        return principal
            .account
            .doctor_id
            .ok_or(ApiError::PermissionDenied);
    }
    requested.ok_or_else(|| ApiError::BadRequest("doctor_id is required".into()))
}

/// `POST /doctor-availabilities`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateAvailabilityRequest>,
) -> Result<(StatusCode, Json<AvailabilityResponse>), ApiError> {
    let doctor_id = resolve_doctor_id(&principal, req.doctor_id)?;
    let window = AvailabilityWindow {
        id: Uuid::new_v4(),
        doctor_id,
        branch_id: req.branch_id,
        recurrence: req.recurrence,
        start_time: req.start_time,
        end_time: req.end_time,
        slot_duration_minutes: req.slot_duration_minutes.unwrap_or(DEFAULT_SLOT_MINUTES),
        is_active: true,
    };
    window
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let conn = ctx.lock_db()?;
    let overlapping = availability::find_time_overlaps(
        &conn,
        &doctor_id,
        window.start_time,
        window.end_time,
        None,
    )?;
    let generated = availability::insert_window(
        &conn,
        &window,
        Utc::now().date_naive(),
        SLOT_HORIZON_DAYS,
    )?;
    tracing::info!(window_id = %window.id, slots = generated.len(), "availability created");

    Ok((
        StatusCode::CREATED,
        Json(AvailabilityResponse {
            window,
            generated_slots: generated.len(),
            overlapping,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default, alias = "doctorId")]
    pub doctor_id: Option<Uuid>,
}

/// `GET /doctor-availabilities`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AvailabilityWindow>>, ApiError> {
    let doctor_id = resolve_doctor_id(&principal, query.doctor_id)?;
    let conn = ctx.lock_db()?;
    let windows = availability::list_windows_for_doctor(&conn, &doctor_id)?;
    Ok(Json(windows))
}

/// `GET /doctor-availabilities/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(_principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<AvailabilityWindow>, ApiError> {
    let conn = ctx.lock_db()?;
    let window = availability::get_window(&conn, &id)?;
    Ok(Json(window))
}

/// `GET /doctor-availabilities/:id/slots`
pub async fn slots(
    State(ctx): State<ApiContext>,
    Extension(_principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TimeSlot>>, ApiError> {
    let conn = ctx.lock_db()?;
    availability::get_window(&conn, &id)?;
    let slots = availability::list_slots(&conn, &id)?;
    Ok(Json(slots))
}

#[derive(Debug, Deserialize)]
pub struct FormQuery {
    #[serde(default, alias = "availabilityId")]
    pub availability_id: Option<Uuid>,
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct FormResponse {
    pub model: FormModel,
    pub branches: Vec<Branch>,
}

/// `GET /doctor-availabilities/form`: seed the availability editor.
///
/// With `availability_id` the persisted window and its slots back the form;
/// otherwise `start`/`end` describe the range dragged out on the calendar.
/// Branch options come back with the relevant branch surfaced first.
pub async fn form(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<FormQuery>,
) -> Result<Json<FormResponse>, ApiError> {
    let conn = ctx.lock_db()?;
    let existing = match query.availability_id {
        Some(id) => {
            let window = availability::get_window(&conn, &id)?;
            let slots = availability::list_slots(&conn, &id)?;
            Some((window, slots))
        }
        None => None,
    };
    let selected = match (query.start, query.end) {
        (Some(start), Some(end)) => Some(SelectedRange { start, end }),
        _ => None,
    };
    let model = form::derive_defaults(
        selected,
        existing.as_ref().map(|(w, s)| (w, s.as_slice())),
    );

    let branches = match principal.account.clinic_id {
        Some(clinic_id) => tenancy::list_branches(&conn, &clinic_id)?,
        None => Vec::new(),
    };
    let current_branch = existing
        .as_ref()
        .map(|(w, _)| w.branch_id)
        .or(principal.account.branch_id);
    let branches = match current_branch {
        Some(current) => form::reorder_branch_options(&current, &branches),
        None => branches,
    };

    Ok(Json(FormResponse { model, branches }))
}

/// `PATCH /doctor-availabilities/:id`: apply a calendar drag/resize.
/// Re-activates the window, regenerates unbooked slots, keeps booked ones.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(_principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveAvailabilityRequest>,
) -> Result<Json<AvailabilityWindow>, ApiError> {
    let conn = ctx.lock_db()?;
    let window = availability::move_window(
        &conn,
        &id,
        req.start,
        req.end,
        Utc::now().date_naive(),
        SLOT_HORIZON_DAYS,
    )?;
    tracing::info!(window_id = %id, "availability moved");
    Ok(Json(window))
}

/// `DELETE /doctor-availabilities/:id`: deactivate; booked slots survive.
pub async fn deactivate(
    State(ctx): State<ApiContext>,
    Extension(_principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.lock_db()?;
    availability::deactivate_window(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
