//! Registration: stage the account, email a code, create on verification.

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use crate::api::notify::OtpMessage;

use super::otp::OtpError;
use super::password::{hash_password, valid_password};
use super::session::session_cookie;
use super::state::{AuthState, PendingRegistration};
use super::storage::{self, InsertUserOutcome, NewUser};
use super::types::{MessageResponse, RegisterRequest, SessionUserResponse, VerifyRegistrationRequest};
use super::utils::{normalize_email, valid_email};

/// Start registration: validate input, stage the account, send a code.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 202, description = "Verification code sent", body = MessageResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email or username already registered"),
        (status = 500, description = "Database error"),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&payload.email);
    let username = payload.username.trim().to_string();

    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "Username, email and password are required".to_string(),
        )
            .into_response();
    }

    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email address".to_string()).into_response();
    }

    if payload.password != payload.confirm_password {
        return (StatusCode::BAD_REQUEST, "Passwords do not match".to_string()).into_response();
    }

    if !valid_password(&payload.password) {
        return (
            StatusCode::BAD_REQUEST,
            "Password must be at least 6 characters".to_string(),
        )
            .into_response();
    }

    match storage::email_exists(&pool, &email).await {
        Ok(true) => {
            return (StatusCode::CONFLICT, "Email already registered".to_string()).into_response();
        }
        Ok(false) => {}
        Err(err) => {
            error!("email existence check failed: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    }

    match storage::username_exists(&pool, &username).await {
        Ok(true) => {
            return (StatusCode::CONFLICT, "Username already taken".to_string()).into_response();
        }
        Ok(false) => {}
        Err(err) => {
            error!("username existence check failed: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    }

    // New accounts are always plain users; roles are assigned out of band.
    let registration = PendingRegistration {
        username,
        email: email.clone(),
        password: payload.password,
        full_name: payload.full_name,
        phone: payload.phone,
        role: "user".to_string(),
    };
    auth_state.stash_pending_registration(registration).await;

    let code = auth_state.otp_store().issue(&email).await;
    let message = OtpMessage {
        to_email: email,
        code,
        purpose: "registration",
    };
    if let Err(err) = auth_state.otp_sender().send(&message) {
        error!("failed to hand off registration code: {err}");
    }

    (
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Verification code sent".to_string(),
        }),
    )
        .into_response()
}

/// Finish registration: verify the code, create the user, open a session.
#[utoipa::path(
    post,
    path = "/v1/auth/verify-registration",
    request_body = VerifyRegistrationRequest,
    responses(
        (status = 201, description = "Account created", body = SessionUserResponse),
        (status = 400, description = "Invalid or expired code"),
        (status = 409, description = "Email or username already registered"),
        (status = 500, description = "Database error"),
    ),
    tag = "auth"
)]
pub async fn verify_registration(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<VerifyRegistrationRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&payload.email);

    if let Err(err) = auth_state.otp_store().verify(&email, &payload.code).await {
        let message = match err {
            OtpError::NotFound => "No verification code found",
            OtpError::Expired => "Verification code expired",
            OtpError::Mismatch => "Invalid verification code",
        };
        return (StatusCode::BAD_REQUEST, message.to_string()).into_response();
    }

    let Some(registration) = auth_state.take_pending_registration(&email).await else {
        return (
            StatusCode::BAD_REQUEST,
            "Registration session expired, please register again".to_string(),
        )
            .into_response();
    };

    let password_hash = match hash_password(&registration.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("failed to hash password: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    };

    let new_user = NewUser {
        username: &registration.username,
        email: &registration.email,
        password_hash: &password_hash,
        role: &registration.role,
        full_name: registration.full_name.as_deref(),
        phone: registration.phone.as_deref(),
    };

    let user_id = match storage::insert_user(&pool, &new_user).await {
        Ok(InsertUserOutcome::Created(id)) => id,
        Ok(InsertUserOutcome::Conflict) => {
            return (
                StatusCode::CONFLICT,
                "Email or username already registered".to_string(),
            )
                .into_response();
        }
        Err(err) => {
            error!("failed to insert user: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    };

    let ttl = auth_state.config().session_ttl_seconds();
    let token = match storage::insert_session(&pool, user_id, ttl).await {
        Ok(token) => token,
        Err(err) => {
            error!("failed to create session: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    };

    (
        StatusCode::CREATED,
        [(header::SET_COOKIE, session_cookie(&token, ttl))],
        Json(SessionUserResponse {
            id: user_id,
            username: registration.username,
            email: registration.email,
            role: registration.role,
            full_name: registration.full_name,
        }),
    )
        .into_response()
}
