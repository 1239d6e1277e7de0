//! Shared types for the admin API layer.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::auth::Role;
use crate::db::repository::account::Account;
use crate::scheduling::{AvailabilityWindow, Recurrence};

/// Shared state for all routes and middleware: the single SQLite handle.
#[derive(Clone)]
pub struct ApiContext {
    pub db: Arc<Mutex<Connection>>,
}

impl ApiContext {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}

/// The authenticated caller, injected into request extensions by the auth
/// middleware. Carries the raw bearer token so logout can revoke it.
#[derive(Clone)]
pub struct Principal {
    pub account: Account,
    pub role: Role,
    pub access_token: String,
}

// ── Wire types ───────────────────────────────────────────────────────────────

/// `POST /login`: the portal field scopes which role the session is issued
/// under. The doctor portal has its own endpoint.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub portal: Role,
}

#[derive(Debug, Deserialize)]
pub struct DoctorLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct DoctorRegisterRequest {
    #[serde(alias = "clinicId")]
    pub clinic_id: Uuid,
    #[serde(default, alias = "branchId")]
    pub branch_id: Option<Uuid>,
    #[serde(alias = "fullName")]
    pub full_name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAvailabilityRequest {
    /// Required for clinic/branch sessions; ignored for doctor sessions,
    /// which always operate on their own calendar.
    #[serde(default, alias = "doctorId")]
    pub doctor_id: Option<Uuid>,
    #[serde(alias = "branchId")]
    pub branch_id: Uuid,
    pub recurrence: Recurrence,
    #[serde(alias = "startTime")]
    pub start_time: NaiveTime,
    #[serde(alias = "endTime")]
    pub end_time: NaiveTime,
    #[serde(default, alias = "slotDurationMinutes")]
    pub slot_duration_minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub window: AvailabilityWindow,
    pub generated_slots: usize,
    /// Advisory: active windows of the same doctor overlapping in time.
    pub overlapping: Vec<Uuid>,
}

/// `PATCH /doctor-availabilities/:id`: a calendar drag/resize.
#[derive(Debug, Deserialize)]
pub struct MoveAvailabilityRequest {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: i64,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default, alias = "clinicId")]
    pub clinic_id: Option<Uuid>,
    #[serde(alias = "planId")]
    pub plan_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct FreeTrialRequest {
    #[serde(alias = "clinicId")]
    pub clinic_id: Uuid,
    #[serde(alias = "planId")]
    pub plan_id: Uuid,
    #[serde(alias = "bookingLimit")]
    pub booking_limit: i64,
}
