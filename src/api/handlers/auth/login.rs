//! Login: throttled credential verification and session creation.

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};

use super::password::CredentialScheme;
use super::session::session_cookie;
use super::state::AuthState;
use super::storage;
use super::throttle::{attempt_key, LoginDecision};
use super::types::{LoginRequest, SessionUserResponse};
use super::utils::{extract_client_ip, normalize_email};

/// Authenticate with email and password.
///
/// Failed attempts count against a fixed window per identity. The throttle
/// decision comes before any credential check, so a locked-out identity
/// learns nothing about whether its password was right.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = SessionUserResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid email or password"),
        (status = 429, description = "Too many failed attempts"),
        (status = 500, description = "Database error"),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&payload.email);

    if email.is_empty() || payload.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "Email and password required".to_string(),
        )
            .into_response();
    }

    let client_ip = extract_client_ip(&headers);
    let key = attempt_key(Some(&email), client_ip.as_deref());

    if auth_state.throttle().check(&key).await == LoginDecision::TooManyAttempts {
        info!(key = %key, "login throttled");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many failed login attempts. Please try again later.".to_string(),
        )
            .into_response();
    }

    let user = match storage::lookup_user_by_email(&pool, &email).await {
        Ok(user) => user,
        Err(err) => {
            error!("user lookup failed: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    };

    // Unknown email and wrong password take the same path: one failure
    // recorded, one generic message.
    let Some(user) = user else {
        auth_state.throttle().record_failure(&key).await;
        return (
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
        )
            .into_response();
    };

    if !CredentialScheme::from_stored(&user.password).verify(&payload.password) {
        auth_state.throttle().record_failure(&key).await;
        return (
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
        )
            .into_response();
    }

    auth_state.throttle().record_success(&key).await;

    let ttl = auth_state.config().session_ttl_seconds();
    let token = match storage::insert_session(&pool, user.id, ttl).await {
        Ok(token) => token,
        Err(err) => {
            error!("failed to create session: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    };

    info!(user_id = %user.id, "login succeeded");

    (
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token, ttl))],
        Json(SessionUserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            full_name: user.full_name,
        }),
    )
        .into_response()
}
