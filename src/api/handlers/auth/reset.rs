//! Password reset flow: request a code, verify it, set a new password.

use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use crate::api::notify::OtpMessage;

use super::otp::OtpError;
use super::password::{hash_password, valid_password};
use super::state::AuthState;
use super::storage;
use super::types::{
    ForgotPasswordRequest, MessageResponse, ResendOtpRequest, ResetPasswordRequest,
    VerifyResetRequest,
};
use super::utils::normalize_email;

/// Request a password reset code.
///
/// The response is the same whether or not the account exists, so the
/// endpoint cannot be used to probe for registered emails.
#[utoipa::path(
    post,
    path = "/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 202, description = "Reset instructions sent if the account exists", body = MessageResponse),
        (status = 400, description = "Missing payload"),
        (status = 500, description = "Database error"),
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&payload.email);

    match storage::lookup_user_by_email(&pool, &email).await {
        Ok(Some(_)) => {
            let code = auth_state.otp_store().issue(&email).await;
            let message = OtpMessage {
                to_email: email,
                code,
                purpose: "reset",
            };
            if let Err(err) = auth_state.otp_sender().send(&message) {
                error!("failed to hand off reset code: {err}");
            }
        }
        Ok(None) => {}
        Err(err) => {
            error!("user lookup failed: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    }

    (
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "If an account exists, you will receive reset instructions.".to_string(),
        }),
    )
        .into_response()
}

/// Verify a reset code, unlocking a single password change for the email.
#[utoipa::path(
    post,
    path = "/v1/auth/verify-reset",
    request_body = VerifyResetRequest,
    responses(
        (status = 204, description = "Code accepted, reset unlocked"),
        (status = 400, description = "Invalid or expired code"),
    ),
    tag = "auth"
)]
pub async fn verify_reset(
    Extension(auth_state): Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyResetRequest>>,
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

    auth_state.grant_reset(&email).await;

    StatusCode::NO_CONTENT.into_response()
}

/// Set a new password after the reset code was verified.
#[utoipa::path(
    post,
    path = "/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Password policy violation"),
        (status = 401, description = "No verified reset for this email"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Database error"),
    ),
    tag = "auth"
)]
pub async fn reset_password(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&payload.email);

    if payload.new_password != payload.confirm_password {
        return (StatusCode::BAD_REQUEST, "Passwords do not match".to_string()).into_response();
    }

    if !valid_password(&payload.new_password) {
        return (
            StatusCode::BAD_REQUEST,
            "Password must be at least 6 characters".to_string(),
        )
            .into_response();
    }

    // The grant is single-use; a second reset needs a new verified code.
    if !auth_state.take_reset_grant(&email).await {
        return (
            StatusCode::UNAUTHORIZED,
            "Reset code not verified".to_string(),
        )
            .into_response();
    }

    let password_hash = match hash_password(&payload.new_password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("failed to hash password: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    };

    match storage::update_password(&pool, &email, &password_hash).await {
        Ok(true) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Password updated".to_string(),
            }),
        )
            .into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Account not found".to_string()).into_response(),
        Err(err) => {
            error!("failed to update password: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}

/// Re-send a code for an in-flight registration or reset.
///
/// Issues a fresh code, which invalidates the previous one for the email.
#[utoipa::path(
    post,
    path = "/v1/auth/resend-otp",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "Code re-sent", body = MessageResponse),
        (status = 400, description = "Missing payload"),
    ),
    tag = "auth"
)]
pub async fn resend_otp(
    Extension(auth_state): Extension<Arc<AuthState>>,
    payload: Option<Json<ResendOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&payload.email);

    let code = auth_state.otp_store().issue(&email).await;
    let message = OtpMessage {
        to_email: email,
        code,
        purpose: "resend",
    };
    if let Err(err) = auth_state.otp_sender().send(&message) {
        error!("failed to hand off resent code: {err}");
    }

    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Verification code sent".to_string(),
        }),
    )
        .into_response()
}
