//! Booking status workflow.
//!
//! Status changes are admin-driven and recorded as an append-only history;
//! the current status is always the latest history entry. Bookings are
//! never physically deleted here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum BookingError {
    #[error("unknown booking status code: {0}")]
    UnknownStatusCode(i64),
}

/// The admin-visible booking states and their wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Dispatched,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn code(&self) -> i64 {
        match self {
            BookingStatus::Pending => 0,
            BookingStatus::Confirmed => 1,
            BookingStatus::Dispatched => 2,
            BookingStatus::Completed => 3,
            BookingStatus::Cancelled => 4,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, BookingError> {
        match code {
            0 => Ok(BookingStatus::Pending),
            1 => Ok(BookingStatus::Confirmed),
            2 => Ok(BookingStatus::Dispatched),
            3 => Ok(BookingStatus::Completed),
            4 => Ok(BookingStatus::Cancelled),
            other => Err(BookingError::UnknownStatusCode(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub clinic_id: Uuid,
    /// Patient snapshot captured by the (out of scope) patient-facing flow.
    pub patient_full_detail: serde_json::Value,
    pub shipping_address: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One append-only status-change record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: BookingStatus,
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// The current status is derivable as the latest history entry.
pub fn current_status(history: &[StatusHistoryEntry]) -> Option<BookingStatus> {
    history.last().map(|entry| entry.status)
}
