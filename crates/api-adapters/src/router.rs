//! Route table and the tower layer stack.

use axum::{
    http::HeaderName,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::handlers::{auth, boards, comments, system};
use crate::middleware::{record_visit, track_requests};
use crate::state::AppState;

const REQUEST_ID: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID);

    // Board reads are logged to the visit table.
    let board_routes = Router::new()
        .route("/api/boards", get(boards::list_boards).post(boards::create_board))
        .route(
            "/api/boards/{id}",
            get(boards::get_board).patch(boards::update_board).delete(boards::delete_board),
        )
        .route_layer(from_fn_with_state(state.clone(), record_visit));

    let api_routes = Router::new()
        .route(
            "/api/boards/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/healthz", get(system::healthz))
        .route("/metrics", get(system::metrics));

    Router::new()
        .merge(board_routes)
        .merge(api_routes)
        .fallback(system::not_found)
        .layer(from_fn_with_state(state.clone(), track_requests))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(CompressionLayer::new()),
        )
}
