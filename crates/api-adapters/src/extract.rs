//! Extractors whose rejections use the JSON error envelope, plus the
//! session-cookie extractor.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{request::Parts, HeaderMap},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use domains::Session;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::state::{AppState, SESSION_COOKIE};

/// `axum::Json` with a 400 envelope on malformed bodies.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `axum::extract::Path` with a 400 envelope on unparsable segments.
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(format!("invalid id: {}", rejection.body_text())))?;
        Ok(Self(value))
    }
}

/// `axum::extract::Query` with a 400 envelope on bad parameters.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Decodes the session cookie, if any. Invalid tokens read as anonymous.
pub fn session_from_headers(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let jar = CookieJar::from_headers(headers);
    state.auth.session_from_token(jar.get(SESSION_COOKIE).map(|c| c.value()))
}

/// Requires a valid session; rejects with 401 otherwise.
pub struct CurrentSession(pub Session);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_from_headers(state, &parts.headers)
            .map(Self)
            .ok_or_else(ApiError::unauthenticated)
    }
}
