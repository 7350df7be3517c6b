//! `/api/auth` handlers. The session token travels only in the `session`
//! cookie; it is never part of a response body.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use domains::{DomainError, RegisteredUser, Session};
use serde::Deserialize;

use crate::envelope::ApiResponse;
use crate::error::ApiError;
use crate::extract::{ApiJson, CurrentSession};
use crate::state::{AppState, SESSION_COOKIE};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisteredUser>>), ApiError> {
    let user = state.auth.register(&body.username, &body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok_with_message(user, "registered"))))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<Session>>), ApiError> {
    let outcome = match state.auth.login(&body.email, &body.password).await {
        Ok(outcome) => outcome,
        Err(err) => {
            if matches!(err, DomainError::Unauthenticated(_)) {
                state.metrics.record_login(false);
            }
            return Err(err.into());
        }
    };
    state.metrics.record_login(true);

    let max_age = time::Duration::seconds(state.auth.session_ttl().num_seconds());
    let cookie = Cookie::build((SESSION_COOKIE, outcome.token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .secure(state.cookies.secure);

    Ok((jar.add(cookie), Json(ApiResponse::ok_with_message(outcome.session, "logged in"))))
}

/// Always succeeds, with or without a session. The cookie is overwritten
/// with an empty, already-expired one.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    let cleared = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .secure(state.cookies.secure);
    (jar.add(cleared), Json(ApiResponse::message("logged out")))
}

pub async fn me(CurrentSession(session): CurrentSession) -> Json<ApiResponse<Session>> {
    Json(ApiResponse::ok(session))
}
