use std::sync::Arc;

use domains::VisitRepository;
use services::{AuthService, BoardService, CommentService};

use crate::metrics::Metrics;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSettings {
    /// Adds the `Secure` attribute; enable behind TLS.
    pub secure: bool,
}

/// Shared handler state, built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub boards: Arc<BoardService>,
    pub comments: Arc<CommentService>,
    pub visits: Arc<dyn VisitRepository>,
    pub metrics: Arc<Metrics>,
    pub cookies: CookieSettings,
}
