//! Session extraction and the session/logout endpoints.

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use sqlx::PgPool;
use tracing::error;

use super::storage::{self, SessionUser};
use super::types::SessionUserResponse;
use super::utils::hash_session_token;

pub(crate) const SESSION_COOKIE_NAME: &str = "festa_session";

/// Pull the session token from the cookie or an Authorization bearer header.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').map(str::trim).find_map(|cookie| {
                cookie
                    .strip_prefix(SESSION_COOKIE_NAME)
                    .and_then(|rest| rest.strip_prefix('='))
            })
        })
        .filter(|token| !token.is_empty())
        .map(str::to_string);
    if from_cookie.is_some() {
        return from_cookie;
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Resolve the authenticated user for a request, if any.
///
/// Returns `Err` only on database failure so callers can map it to a 500.
pub(crate) async fn current_user(
    pool: &PgPool,
    headers: &HeaderMap,
) -> anyhow::Result<Option<SessionUser>> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    storage::lookup_session(pool, &hash_session_token(&token)).await
}

/// Build the Set-Cookie value carrying a fresh session token.
pub(super) fn session_cookie(token: &str, max_age_seconds: i64) -> String {
    format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}"
    )
}

/// Build the Set-Cookie value that clears the session cookie.
pub(super) fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

impl From<SessionUser> for SessionUserResponse {
    fn from(user: SessionUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            full_name: user.full_name,
        }
    }
}

/// Return the authenticated user for the presented session.
#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Authenticated user", body = SessionUserResponse),
        (status = 204, description = "No valid session"),
        (status = 500, description = "Database error"),
    ),
    tag = "auth"
)]
pub async fn session(
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
) -> impl IntoResponse {
    match current_user(&pool, &headers).await {
        Ok(Some(user)) => Json(SessionUserResponse::from(user)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("session lookup failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}

/// Destroy the presented session and clear the cookie.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session destroyed"),
        (status = 500, description = "Database error"),
    ),
    tag = "auth"
)]
pub async fn logout(Extension(pool): Extension<PgPool>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = extract_session_token(&headers) {
        if let Err(err) = storage::delete_session(&pool, &hash_session_token(&token)).await {
            error!("failed to delete session: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
        }
    }

    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("other=1; festa_session=abc123; theme=dark"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn extracts_token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer xyz789"),
        );
        assert_eq!(extract_session_token(&headers), Some("xyz789".to_string()));
    }

    #[test]
    fn cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("festa_session=cookie-token"),
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );
        assert_eq!(
            extract_session_token(&headers),
            Some("cookie-token".to_string())
        );
    }

    #[test]
    fn empty_cookie_value_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("festa_session="));
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn no_headers_no_token() {
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn session_cookie_shape() {
        let cookie = session_cookie("tok", 3600);
        assert!(cookie.starts_with("festa_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
    }

    #[test]
    fn clear_cookie_zeroes_max_age() {
        let cookie = clear_session_cookie();
        assert!(cookie.contains("Max-Age=0"));
    }
}
