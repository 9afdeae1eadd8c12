//! Public event catalog endpoints.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{error, Instrument};
use utoipa::{IntoParams, ToSchema};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct EventResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub capacity: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(IntoParams, Deserialize, Debug, Default)]
pub struct EventFilters {
    /// Event type; `all` or absent means no filter.
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    /// Exact calendar date (YYYY-MM-DD).
    pub date: Option<NaiveDate>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

fn event_from_row(row: &PgRow) -> EventResponse {
    EventResponse {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        event_type: row.get("type"),
        date: row.get("date"),
        time: row.get("time"),
        location: row.get("location"),
        price: row.get("price"),
        capacity: row.get("capacity"),
        image_url: row.get("image_url"),
        created_at: row.get("created_at"),
    }
}

/// Fetch a single event row, shared with the booking flow.
pub(crate) async fn find_event(pool: &PgPool, id: i64) -> anyhow::Result<Option<EventResponse>> {
    let query = r"
        SELECT id, title, description, type, date, time, location, price,
               capacity, image_url, created_at
        FROM events
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
        .await?;
    Ok(row.as_ref().map(event_from_row))
}

/// List upcoming events with optional filters.
///
/// Undated events are treated as upcoming and always listed.
#[utoipa::path(
    get,
    path = "/v1/events",
    params(EventFilters),
    responses(
        (status = 200, description = "Matching upcoming events", body = [EventResponse]),
        (status = 500, description = "Database error"),
    ),
    tag = "events"
)]
pub async fn list_events(
    Extension(pool): Extension<PgPool>,
    Query(filters): Query<EventFilters>,
) -> impl IntoResponse {
    // "all" is the UI's no-filter sentinel.
    let event_type = filters
        .event_type
        .filter(|value| !value.is_empty() && value != "all");

    let query = r"
        SELECT id, title, description, type, date, time, location, price,
               capacity, image_url, created_at
        FROM events
        WHERE ($1::TEXT IS NULL OR type = $1)
          AND ($2::DATE IS NULL OR date = $2)
          AND ($3::DOUBLE PRECISION IS NULL OR price >= $3)
          AND ($4::DOUBLE PRECISION IS NULL OR price <= $4)
          AND (date >= CURRENT_DATE OR date IS NULL)
        ORDER BY date ASC
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(event_type)
        .bind(filters.date)
        .bind(filters.min_price)
        .bind(filters.max_price)
        .fetch_all(&pool)
        .instrument(span)
        .await;

    match rows {
        Ok(rows) => {
            let events: Vec<EventResponse> = rows.iter().map(event_from_row).collect();
            Json(events).into_response()
        }
        Err(err) => {
            error!("failed to list events: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}

/// Fetch one event by id.
#[utoipa::path(
    get,
    path = "/v1/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event", body = EventResponse),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Database error"),
    ),
    tag = "events"
)]
pub async fn get_event(
    Extension(pool): Extension<PgPool>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match find_event(&pool, id).await {
        Ok(Some(event)) => Json(event).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Event not found".to_string()).into_response(),
        Err(err) => {
            error!("failed to fetch event: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}
