//! Database helpers for bookings and services.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{BookingStatsResponse, BookingStatus, BookingSummary, ServiceResponse};

/// A booking row as stored, before joining event or service details.
pub(super) struct BookingRecord {
    pub(super) id: i64,
    pub(super) user_id: Uuid,
    pub(super) event_id: i64,
    pub(super) guest_count: i32,
    pub(super) total_amount: f64,
    pub(super) service_ids: Vec<i64>,
    pub(super) status: String,
    pub(super) created_at: DateTime<Utc>,
}

/// Prices of the selected services that exist. Unknown ids return no row.
pub(super) async fn service_prices(pool: &PgPool, service_ids: &[i64]) -> Result<Vec<f64>> {
    if service_ids.is_empty() {
        return Ok(Vec::new());
    }

    let query = "SELECT price FROM services WHERE id = ANY($1)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(service_ids)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to fetch service prices")?;

    Ok(rows.iter().map(|row| row.get("price")).collect())
}

/// Full service rows for the ids a booking selected.
pub(super) async fn services_by_ids(
    pool: &PgPool,
    service_ids: &[i64],
) -> Result<Vec<ServiceResponse>> {
    if service_ids.is_empty() {
        return Ok(Vec::new());
    }

    let query = "SELECT id, name, description, price FROM services WHERE id = ANY($1) ORDER BY id";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(service_ids)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to fetch services")?;

    Ok(rows
        .iter()
        .map(|row| ServiceResponse {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            price: row.get("price"),
        })
        .collect())
}

pub(super) struct NewBooking<'a> {
    pub(super) user_id: Uuid,
    pub(super) event_id: i64,
    pub(super) guest_count: i32,
    pub(super) total_amount: f64,
    pub(super) service_ids: &'a [i64],
}

pub(super) async fn insert_booking(
    pool: &PgPool,
    booking: &NewBooking<'_>,
) -> Result<(i64, DateTime<Utc>)> {
    let query = r"
        INSERT INTO bookings (user_id, event_id, guest_count, total_amount, service_ids, status)
        VALUES ($1, $2, $3, $4, $5, 'pending')
        RETURNING id, created_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(booking.user_id)
        .bind(booking.event_id)
        .bind(booking.guest_count)
        .bind(booking.total_amount)
        .bind(booking.service_ids)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert booking")?;

    Ok((row.get("id"), row.get("created_at")))
}

/// The caller's bookings, newest first, joined with event details.
pub(super) async fn bookings_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<BookingSummary>> {
    let query = r"
        SELECT bookings.id, bookings.guest_count, bookings.total_amount,
               bookings.status, bookings.created_at,
               events.title AS event_title, events.date AS event_date,
               events.location AS event_location
        FROM bookings
        JOIN events ON events.id = bookings.event_id
        WHERE bookings.user_id = $1
        ORDER BY bookings.created_at DESC
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(user_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list bookings")?;

    Ok(rows
        .iter()
        .map(|row| BookingSummary {
            id: row.get("id"),
            guest_count: row.get("guest_count"),
            total_amount: row.get("total_amount"),
            status: parse_status(row.get("status")),
            created_at: row.get("created_at"),
            event_title: row.get("event_title"),
            event_date: row.get("event_date"),
            event_location: row.get("event_location"),
        })
        .collect())
}

pub(super) async fn booking_stats(pool: &PgPool, user_id: Uuid) -> Result<BookingStatsResponse> {
    let query = r"
        SELECT COUNT(*) AS total_bookings,
               COUNT(*) FILTER (WHERE status = 'confirmed') AS confirmed_bookings,
               COALESCE(SUM(total_amount), 0) AS total_spent
        FROM bookings
        WHERE user_id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to fetch booking stats")?;

    Ok(BookingStatsResponse {
        total_bookings: row.get("total_bookings"),
        confirmed_bookings: row.get("confirmed_bookings"),
        total_spent: row.get("total_spent"),
    })
}

pub(super) async fn find_booking(pool: &PgPool, id: i64) -> Result<Option<BookingRecord>> {
    let query = r"
        SELECT id, user_id, event_id, guest_count, total_amount, service_ids,
               status, created_at
        FROM bookings
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch booking")?;

    Ok(row.map(|row| BookingRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        event_id: row.get("event_id"),
        guest_count: row.get("guest_count"),
        total_amount: row.get("total_amount"),
        service_ids: row.get("service_ids"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }))
}

pub(super) async fn update_booking_status(
    pool: &PgPool,
    id: i64,
    status: BookingStatus,
) -> Result<bool> {
    let query = "UPDATE bookings SET status = $2 WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update booking status")?;
    Ok(result.rows_affected() > 0)
}

/// Stored statuses are constrained by the schema; anything else in a row is
/// treated as pending rather than failing the whole response.
pub(super) fn parse_status(stored: &str) -> BookingStatus {
    stored.parse().unwrap_or(BookingStatus::Pending)
}

#[cfg(test)]
mod tests {
    use super::parse_status;
    use super::BookingStatus;

    #[test]
    fn parse_status_maps_known_values() {
        assert_eq!(parse_status("confirmed"), BookingStatus::Confirmed);
        assert_eq!(parse_status("cancelled"), BookingStatus::Cancelled);
        assert_eq!(parse_status("completed"), BookingStatus::Completed);
    }

    #[test]
    fn parse_status_defaults_to_pending() {
        assert_eq!(parse_status("pending"), BookingStatus::Pending);
        assert_eq!(parse_status("bogus"), BookingStatus::Pending);
    }
}
