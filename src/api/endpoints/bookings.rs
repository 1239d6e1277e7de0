//! Patient booking endpoints: list, status change, history.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ChangeStatusRequest, Principal};
use crate::booking::{Booking, BookingStatus, StatusHistoryEntry};
use crate::db::repository::booking;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default, alias = "clinicId")]
    pub clinic_id: Option<Uuid>,
}

/// Clinic-scoped sessions see their own bookings; a super-admin names the
/// clinic via query parameter.
fn resolve_clinic_id(principal: &Principal, requested: Option<Uuid>) -> Result<Uuid, ApiError> {
    match principal.account.clinic_id {
        Some(own) => Ok(own),
        None => requested.ok_or_else(|| ApiError::BadRequest("clinic_id is required".into())),
    }
}

/// `GET /patient-bookings`: newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let clinic_id = resolve_clinic_id(&principal, query.clinic_id)?;
    let conn = ctx.lock_db()?;
    let bookings = booking::list_bookings(&conn, &clinic_id)?;
    Ok(Json(bookings))
}

/// `PATCH /patient-bookings/:id`: admin status change. Updates the current
/// status and appends the history entry atomically. Unknown status code is
/// a 400, unknown booking a 404.
pub async fn change_status(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<Booking>, ApiError> {
    let status = BookingStatus::from_code(req.status)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let conn = ctx.lock_db()?;
    let updated = booking::change_status(&conn, &id, status, Some(&principal.account.email))?;
    tracing::info!(booking_id = %id, status = ?status, "booking status changed");
    Ok(Json(updated))
}

/// `GET /patient-bookings/:id/history`: append-only trail, oldest first.
pub async fn history(
    State(ctx): State<ApiContext>,
    Extension(_principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StatusHistoryEntry>>, ApiError> {
    let conn = ctx.lock_db()?;
    booking::get_booking(&conn, &id)?;
    let history = booking::list_history(&conn, &id)?;
    Ok(Json(history))
}
