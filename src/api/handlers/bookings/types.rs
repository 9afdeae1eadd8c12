//! Request/response types for booking endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::api::handlers::events::EventResponse;

/// Lifecycle of a booking. Stored lowercase in the database.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(()),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateBookingRequest {
    pub event_id: i64,
    pub guest_count: i32,
    /// Selected add-on service ids. Unknown ids are ignored in the total.
    pub service_ids: Option<Vec<i64>>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct BookingResponse {
    pub id: i64,
    pub event_id: i64,
    pub guest_count: i32,
    pub total_amount: f64,
    pub service_ids: Vec<i64>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Row in the caller's booking list, joined with event details.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct BookingSummary {
    pub id: i64,
    pub guest_count: i32,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub event_title: String,
    pub event_date: Option<chrono::NaiveDate>,
    pub event_location: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct BookingStatsResponse {
    pub total_bookings: i64,
    pub confirmed_bookings: i64,
    pub total_spent: f64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ServiceResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct BookingDetailsResponse {
    pub id: i64,
    pub guest_count: i32,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub event: Option<EventResponse>,
    pub services: Vec<ServiceResponse>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_lowercase() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            let parsed: BookingStatus = status.as_str().parse().expect("parse");
            assert_eq!(parsed, status);

            let json = serde_json::to_string(&status).expect("serialize");
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(BookingStatus::from_str("shipped").is_err());
        assert!(BookingStatus::from_str("Pending").is_err());
        assert!(BookingStatus::from_str("").is_err());
    }
}
