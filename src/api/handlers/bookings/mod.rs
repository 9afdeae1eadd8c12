//! Booking endpoints: create, list, stats, details, cancel, status updates.
//!
//! All routes require a session; details and cancel are restricted to the
//! booking owner or an admin.

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use sqlx::PgPool;
use tracing::error;

use super::auth::session::current_user;
use super::auth::storage::SessionUser;
use super::events;

pub mod storage;
pub mod total;
pub mod types;

use storage::{BookingRecord, NewBooking};
use types::{
    BookingDetailsResponse, BookingResponse, BookingStatus, CreateBookingRequest,
    UpdateStatusRequest,
};

/// Resolve the caller or produce the response that ends the request.
async fn require_user(pool: &PgPool, headers: &HeaderMap) -> Result<SessionUser, axum::response::Response> {
    match current_user(pool, headers).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            Err((StatusCode::UNAUTHORIZED, "Not authenticated".to_string()).into_response())
        }
        Err(err) => {
            error!("session lookup failed: {err}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response())
        }
    }
}

fn is_owner_or_admin(booking: &BookingRecord, user: &SessionUser) -> bool {
    booking.user_id == user.id || user.role == "admin"
}

/// Book an event with optional add-on services.
///
/// The total is computed server-side from the event price and the selected
/// services; client-provided amounts are never trusted.
#[utoipa::path(
    post,
    path = "/v1/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Database error"),
    ),
    tag = "bookings"
)]
pub async fn create_booking(
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    payload: Option<Json<CreateBookingRequest>>,
) -> impl IntoResponse {
    let user = match require_user(&pool, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    if payload.guest_count < 1 {
        return (
            StatusCode::BAD_REQUEST,
            "Guest count must be at least 1".to_string(),
        )
            .into_response();
    }

    let event = match events::find_event(&pool, payload.event_id).await {
        Ok(Some(event)) => event,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "Event not found".to_string()).into_response();
        }
        Err(err) => {
            error!("event lookup failed: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    };

    let service_ids = payload.service_ids.unwrap_or_default();

    let prices = match storage::service_prices(&pool, &service_ids).await {
        Ok(prices) => prices,
        Err(err) => {
            error!("service price lookup failed: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    };

    let total_amount = total::compute_total(event.price, &prices);

    let new_booking = NewBooking {
        user_id: user.id,
        event_id: payload.event_id,
        guest_count: payload.guest_count,
        total_amount,
        service_ids: &service_ids,
    };

    match storage::insert_booking(&pool, &new_booking).await {
        Ok((id, created_at)) => (
            StatusCode::CREATED,
            Json(BookingResponse {
                id,
                event_id: payload.event_id,
                guest_count: payload.guest_count,
                total_amount,
                service_ids,
                status: BookingStatus::Pending,
                created_at,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("failed to insert booking: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}

/// The caller's bookings, newest first.
#[utoipa::path(
    get,
    path = "/v1/bookings",
    responses(
        (status = 200, description = "Bookings with event details", body = [types::BookingSummary]),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Database error"),
    ),
    tag = "bookings"
)]
pub async fn list_bookings(
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user = match require_user(&pool, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match storage::bookings_for_user(&pool, user.id).await {
        Ok(bookings) => Json(bookings).into_response(),
        Err(err) => {
            error!("failed to list bookings: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}

/// Booking counts and spend for the caller's dashboard.
#[utoipa::path(
    get,
    path = "/v1/bookings/stats",
    responses(
        (status = 200, description = "Booking stats", body = types::BookingStatsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Database error"),
    ),
    tag = "bookings"
)]
pub async fn booking_stats(
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user = match require_user(&pool, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match storage::booking_stats(&pool, user.id).await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => {
            error!("failed to fetch booking stats: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}

/// One booking with its event and selected services.
#[utoipa::path(
    get,
    path = "/v1/bookings/{id}",
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking details", body = BookingDetailsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "Booking not found"),
        (status = 500, description = "Database error"),
    ),
    tag = "bookings"
)]
pub async fn booking_details(
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let user = match require_user(&pool, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let booking = match storage::find_booking(&pool, id).await {
        Ok(Some(booking)) => booking,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "Booking not found".to_string()).into_response();
        }
        Err(err) => {
            error!("failed to fetch booking: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    };

    if !is_owner_or_admin(&booking, &user) {
        return (StatusCode::FORBIDDEN, "Access denied".to_string()).into_response();
    }

    let event = match events::find_event(&pool, booking.event_id).await {
        Ok(event) => event,
        Err(err) => {
            error!("event lookup failed: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    };

    let services = match storage::services_by_ids(&pool, &booking.service_ids).await {
        Ok(services) => services,
        Err(err) => {
            error!("service lookup failed: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    };

    Json(BookingDetailsResponse {
        id: booking.id,
        guest_count: booking.guest_count,
        total_amount: booking.total_amount,
        status: storage::parse_status(&booking.status),
        created_at: booking.created_at,
        event,
        services,
    })
    .into_response()
}

/// Cancel a booking (owner or admin).
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/cancel",
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 204, description = "Booking cancelled"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "Booking not found"),
        (status = 500, description = "Database error"),
    ),
    tag = "bookings"
)]
pub async fn cancel_booking(
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let user = match require_user(&pool, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let booking = match storage::find_booking(&pool, id).await {
        Ok(Some(booking)) => booking,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "Booking not found".to_string()).into_response();
        }
        Err(err) => {
            error!("failed to fetch booking: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    };

    if !is_owner_or_admin(&booking, &user) {
        return (StatusCode::FORBIDDEN, "Access denied".to_string()).into_response();
    }

    match storage::update_booking_status(&pool, id, BookingStatus::Cancelled).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("failed to cancel booking: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}

/// Set a booking's status (admin only).
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/status",
    params(("id" = i64, Path, description = "Booking id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 204, description = "Status updated"),
        (status = 400, description = "Unknown status value"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Booking not found"),
        (status = 500, description = "Database error"),
    ),
    tag = "bookings"
)]
pub async fn update_booking_status(
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    payload: Option<Json<UpdateStatusRequest>>,
) -> impl IntoResponse {
    let user = match require_user(&pool, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if user.role != "admin" {
        return (StatusCode::FORBIDDEN, "Access denied".to_string()).into_response();
    }

    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let Ok(status) = payload.status.parse::<BookingStatus>() else {
        return (StatusCode::BAD_REQUEST, "Invalid status".to_string()).into_response();
    };

    match storage::update_booking_status(&pool, id, status).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Booking not found".to_string()).into_response(),
        Err(err) => {
            error!("failed to update booking status: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn booking(user_id: Uuid) -> BookingRecord {
        BookingRecord {
            id: 1,
            user_id,
            event_id: 7,
            guest_count: 2,
            total_amount: 150.0,
            service_ids: vec![1, 2],
            status: "pending".to_string(),
            created_at: Utc::now(),
        }
    }

    fn user(id: Uuid, role: &str) -> SessionUser {
        SessionUser {
            id,
            username: "u".to_string(),
            email: "u@example.com".to_string(),
            role: role.to_string(),
            full_name: None,
        }
    }

    #[test]
    fn owner_can_access_own_booking() {
        let id = Uuid::new_v4();
        assert!(is_owner_or_admin(&booking(id), &user(id, "user")));
    }

    #[test]
    fn admin_can_access_any_booking() {
        assert!(is_owner_or_admin(
            &booking(Uuid::new_v4()),
            &user(Uuid::new_v4(), "admin")
        ));
    }

    #[test]
    fn other_users_are_denied() {
        assert!(!is_owner_or_admin(
            &booking(Uuid::new_v4()),
            &user(Uuid::new_v4(), "user")
        ));
    }
}
