//! Request counting and the visit log.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use domains::NewVisit;

use crate::extract::session_from_headers;
use crate::state::AppState;

// Column widths of `user_visits`.
const IP_MAX: usize = 45;
const REFERRER_MAX: usize = 255;

pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let response = next.run(req).await;
    state.metrics.record_request(method.as_str(), response.status().as_u16());
    response
}

/// Logs a `UserVisit` for board reads. A failed insert never fails the
/// request.
pub async fn record_visit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if req.method() == Method::GET {
        let peer = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|c| c.0);
        let visit = NewVisit {
            user_id: session_from_headers(&state, req.headers()).map(|s| s.user_id),
            ip_address: client_ip(req.headers(), peer).map(|ip| truncate(ip, IP_MAX)),
            user_agent: header_str(req.headers(), header::USER_AGENT.as_str()),
            referrer: header_str(req.headers(), header::REFERER.as_str())
                .map(|r| truncate(r, REFERRER_MAX)),
        };
        if let Err(e) = state.visits.record(visit).await {
            tracing::warn!(error = %e, path = %req.uri().path(), "failed to record visit");
        }
    }
    next.run(req).await
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn truncate(mut value: String, max_chars: usize) -> String {
    if let Some((idx, _)) = value.char_indices().nth(max_chars) {
        value.truncate(idx);
    }
    value
}

/// First `X-Forwarded-For` hop, else the socket peer.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_owned()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| peer.map(|p| p.ip().to_string()))
}
