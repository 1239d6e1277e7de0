//! Admin actions driven from the console.
//!
//! Every mutation confirms against the server first: on success the caller
//! gets a success notification plus a fresh refetch of the affected list;
//! on anything else an error notification and no local change at all.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus};
use crate::console::session::SessionClient;
use crate::scheduling::{AvailabilityWindow, EventKey};

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Success(String),
    Error(String),
}

/// Outcome of a status change. `bookings` carries the post-change refetch
/// and is `None` whenever the change was not confirmed.
#[derive(Debug)]
pub struct StatusChangeOutcome {
    pub notification: Notification,
    pub bookings: Option<Vec<Booking>>,
}

impl SessionClient {
    /// `PATCH /patient-bookings/:id`, then refetch the list. A 200 or 204
    /// confirms the change; any other response or a transport failure
    /// yields an error notification and leaves local state untouched.
    pub async fn change_booking_status(
        &self,
        booking_id: &Uuid,
        status: BookingStatus,
    ) -> StatusChangeOutcome {
        let Some(token) = self.bearer_token() else {
            return StatusChangeOutcome {
                notification: Notification::Error("not signed in".into()),
                bookings: None,
            };
        };

        let url = format!("{}/patient-bookings/{booking_id}", self.base_url);
        let result = self
            .http
            .patch(&url)
            .bearer_auth(&token)
            .json(&serde_json::json!({ "status": status.code() }))
            .send()
            .await;

        let confirmed = matches!(
            result.as_ref().map(|r| r.status()),
            Ok(reqwest::StatusCode::OK) | Ok(reqwest::StatusCode::NO_CONTENT)
        );
        if !confirmed {
            let detail = match result {
                Ok(response) => format!("status {}", response.status()),
                Err(e) => e.to_string(),
            };
            tracing::warn!(booking_id = %booking_id, %detail, "status change rejected");
            return StatusChangeOutcome {
                notification: Notification::Error("booking status change failed".into()),
                bookings: None,
            };
        }

        StatusChangeOutcome {
            notification: Notification::Success("booking status updated".into()),
            bookings: self.fetch_bookings(&token).await,
        }
    }

    async fn fetch_bookings(&self, token: &str) -> Option<Vec<Booking>> {
        let url = format!("{}/patient-bookings", self.base_url);
        let response = self.http.get(&url).bearer_auth(token).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json::<Vec<Booking>>().await.ok()
    }

    /// `PATCH /doctor-availabilities/:id`: a calendar drag/resize.
    pub async fn move_availability(
        &self,
        window_id: &Uuid,
        new_start: NaiveDateTime,
        new_end: NaiveDateTime,
    ) -> Result<AvailabilityWindow, Notification> {
        let Some(token) = self.bearer_token() else {
            return Err(Notification::Error("not signed in".into()));
        };

        let url = format!("{}/doctor-availabilities/{window_id}", self.base_url);
        let response = self
            .http
            .patch(&url)
            .bearer_auth(&token)
            .json(&serde_json::json!({ "start": new_start, "end": new_end }))
            .send()
            .await
            .map_err(|e| Notification::Error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Notification::Error(format!(
                "availability update failed: status {}",
                response.status()
            )));
        }
        response
            .json::<AvailabilityWindow>()
            .await
            .map_err(|e| Notification::Error(e.to_string()))
    }

    /// Calendar drag callback entry point. The calendar hands over a raw
    /// event id that may carry an occurrence suffix (`"<id>::recurring-3"`
    /// for materialized recurring events); only the availability id before
    /// the first `::` addresses the backend.
    pub async fn move_calendar_event(
        &self,
        raw_event_id: &str,
        new_start: NaiveDateTime,
        new_end: NaiveDateTime,
    ) -> Result<AvailabilityWindow, Notification> {
        let key = EventKey::parse(raw_event_id)
            .map_err(|e| Notification::Error(e.to_string()))?;
        let window_id = key
            .availability_id
            .parse::<Uuid>()
            .map_err(|_| Notification::Error("malformed availability id".into()))?;
        self.move_availability(&window_id, new_start, new_end).await
    }
}
