//! Plan catalog endpoint with per-clinic selectability gating.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Principal};
use crate::billing::{self, GatedCatalog};
use crate::db::repository::{plan, subscription};

#[derive(Debug, Deserialize)]
pub struct PlansQuery {
    #[serde(default, alias = "clinicId")]
    pub clinic_id: Option<Uuid>,
}

/// `GET /plans`: the catalog partitioned by billing cycle, each plan
/// annotated with whether the calling clinic may select it now. Without a
/// clinic in scope everything is selectable.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<PlansQuery>,
) -> Result<Json<GatedCatalog>, ApiError> {
    let conn = ctx.lock_db()?;
    let catalog = plan::list_plans(&conn)?;

    let clinic_id = principal.account.clinic_id.or(query.clinic_id);
    let now = Utc::now();
    let active = match clinic_id {
        Some(id) => subscription::find_active(&conn, &id, now)?,
        None => None,
    };

    Ok(Json(billing::gate_plans(&catalog, active.as_ref(), now)))
}
