#![allow(dead_code)]

use std::sync::Arc;

use api_adapters::{router, AppState, CookieSettings, Metrics};
use auth_adapters::{Argon2PasswordHasher, JwtSessionCodec};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use services::{AuthService, BoardService, CommentService};
use storage_adapters::MemoryStore;
use tower::ServiceExt;

pub const SECRET: &[u8] = b"test-secret-test-secret-test-sec";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let codec = Arc::new(JwtSessionCodec::new(SECRET, chrono::Duration::hours(168)));
        let auth = AuthService::new(
            store.clone(),
            store.clone(),
            Arc::new(Argon2PasswordHasher::new()),
            codec,
        );
        let state = AppState {
            auth: Arc::new(auth),
            boards: Arc::new(BoardService::new(store.clone())),
            comments: Arc::new(CommentService::new(store.clone(), store.clone())),
            visits: store.clone(),
            metrics: Arc::new(Metrics::new()),
            cookies: CookieSettings::default(),
        };
        Self { router: router(state), store }
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        self.send_request(req).await
    }

    pub async fn send_request(&self, req: Request<Body>) -> TestResponse {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        TestResponse { status, headers, body }
    }

    /// Registers and logs in; returns the `session=...` cookie pair.
    pub async fn login_as(&self, username: &str) -> String {
        let email = format!("{username}@example.com");
        let res = self
            .send(
                "POST",
                "/api/auth/register",
                Some(json!({"username": username, "email": email, "password": "pw1234"})),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

        let res = self
            .send(
                "POST",
                "/api/auth/login",
                Some(json!({"email": email, "password": "pw1234"})),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        session_cookie(&res.headers).expect("login sets the session cookie")
    }

    pub async fn create_board(&self, cookie: &str, title: &str) -> i64 {
        let res = self
            .send(
                "POST",
                "/api/boards",
                Some(json!({"title": title, "content": "body"})),
                Some(cookie),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        res.body["data"]["id"].as_i64().unwrap()
    }
}

/// The `name=value` part of the `session` Set-Cookie header.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    set_cookie(headers).map(|c| c.split(';').next().unwrap_or_default().to_owned())
}

pub fn set_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .map(str::to_owned)
}
