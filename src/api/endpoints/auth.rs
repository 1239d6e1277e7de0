//! Login, logout, registration and the three whoami endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{
    ApiContext, DoctorLoginRequest, DoctorRegisterRequest, LoginRequest, Principal,
};
use crate::auth::profile::Profile;
use crate::auth::service::{self, IssuedSession};
use crate::auth::Role;

/// `POST /login`: super-admin, clinic and branch portals share this
/// endpoint; the request's portal field picks the role the session is
/// issued under.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<IssuedSession>, ApiError> {
    if req.portal == Role::Doctor {
        return Err(ApiError::BadRequest(
            "doctor accounts sign in at /doctors-login".into(),
        ));
    }
    let conn = ctx.lock_db()?;
    let issued = service::login(&conn, &req.email, &req.password, req.portal)?;
    Ok(Json(issued))
}

/// `POST /doctors-login`
pub async fn doctors_login(
    State(ctx): State<ApiContext>,
    Json(req): Json<DoctorLoginRequest>,
) -> Result<Json<IssuedSession>, ApiError> {
    let conn = ctx.lock_db()?;
    let issued = service::login(&conn, &req.email, &req.password, Role::Doctor)?;
    Ok(Json(issued))
}

/// `POST /doctors-register`: doctor self-registration; signs the new
/// account in immediately.
pub async fn doctors_register(
    State(ctx): State<ApiContext>,
    Json(req): Json<DoctorRegisterRequest>,
) -> Result<(StatusCode, Json<IssuedSession>), ApiError> {
    if req.full_name.trim().is_empty() {
        return Err(ApiError::BadRequest("full name is required".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }
    let conn = ctx.lock_db()?;
    service::register_doctor(
        &conn,
        &req.clinic_id,
        req.branch_id.as_ref(),
        &req.full_name,
        req.specialty.as_deref(),
        &req.email,
        &req.password,
    )?;
    let issued = service::login(&conn, &req.email, &req.password, Role::Doctor)?;
    Ok((StatusCode::CREATED, Json(issued)))
}

/// `POST /logout`: revokes the presented session. Idempotent.
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.lock_db()?;
    service::logout(&conn, &principal.access_token)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /me`: profile for super-admin and branch sessions.
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Profile>, ApiError> {
    if !matches!(principal.role, Role::SuperAdmin | Role::Branch) {
        return Err(ApiError::PermissionDenied);
    }
    whoami(&ctx, &principal)
}

/// `GET /clinics/me`: profile for clinic sessions.
pub async fn clinic_me(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Profile>, ApiError> {
    if principal.role != Role::Clinic {
        return Err(ApiError::PermissionDenied);
    }
    whoami(&ctx, &principal)
}

/// `GET /doctors/me`: profile for doctor sessions.
pub async fn doctor_me(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Profile>, ApiError> {
    if principal.role != Role::Doctor {
        return Err(ApiError::PermissionDenied);
    }
    whoami(&ctx, &principal)
}

fn whoami(ctx: &ApiContext, principal: &Principal) -> Result<Json<Profile>, ApiError> {
    let conn = ctx.lock_db()?;
    let profile = service::whoami(&conn, &principal.account, principal.role)?;
    Ok(Json(profile))
}
