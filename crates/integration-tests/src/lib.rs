//! Shared harness for the end-to-end tests: the full router over the
//! in-memory store, real Argon2 hashing and real session tokens.

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

pub const SECRET: &[u8] = b"integration-secret-integration-s";

pub struct Harness {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(
            store.clone(),
            store.clone(),
            Arc::new(Argon2PasswordHasher::new()),
            Arc::new(JwtSessionCodec::new(SECRET, chrono::Duration::hours(168))),
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

    pub async fn call(&self, method: &str, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Reply {
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
        .expect("valid request");

        let res = self.router.clone().oneshot(req).await.expect("infallible router");
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("readable body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply { status, headers, body }
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Reply {
        self.call(
            "POST",
            "/api/auth/register",
            Some(json!({"username": username, "email": email, "password": password})),
            None,
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Reply {
        self.call("POST", "/api/auth/login", Some(json!({"email": email, "password": password})), None)
            .await
    }

    /// Registers `username` and returns its `session=...` cookie pair.
    pub async fn user(&self, username: &str) -> String {
        let email = format!("{username}@example.com");
        let reg = self.register(username, &email, "pw1234").await;
        assert_eq!(reg.status, StatusCode::CREATED, "{}", reg.body);
        let login = self.login(&email, "pw1234").await;
        session_cookie(&login.headers).expect("session cookie")
    }

    pub async fn post_board(&self, cookie: &str, title: &str) -> i64 {
        let res = self
            .call("POST", "/api/boards", Some(json!({"title": title, "content": "text"})), Some(cookie))
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        res.data()["id"].as_i64().expect("board id")
    }

    pub async fn post_comment(&self, cookie: &str, board: i64, content: &str, parent: Option<i64>) -> i64 {
        let res = self
            .call(
                "POST",
                &format!("/api/boards/{board}/comments"),
                Some(json!({"content": content, "parentId": parent})),
                Some(cookie),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        res.data()["id"].as_i64().expect("comment id")
    }
}

pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}
