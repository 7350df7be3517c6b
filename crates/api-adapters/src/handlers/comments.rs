//! `/api/boards/{id}/comments` handlers.

use axum::{extract::State, http::StatusCode, Json};
use domains::{BoardId, CommentId, CommentNode, CommentView};
use serde::Deserialize;

use crate::envelope::ApiResponse;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, CurrentSession};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
    pub parent_id: Option<i64>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath(board_id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Vec<CommentNode>>>, ApiError> {
    let tree = state.comments.list_comments(BoardId(board_id)).await?;
    Ok(Json(ApiResponse::ok(tree)))
}

pub async fn create_comment(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiPath(board_id): ApiPath<i64>,
    ApiJson(body): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CommentView>>), ApiError> {
    let created = state
        .comments
        .create_comment(BoardId(board_id), &session, &body.content, body.parent_id.map(CommentId))
        .await?;
    state.metrics.comment_created();
    Ok((StatusCode::CREATED, Json(ApiResponse::ok_with_message(created, "comment created"))))
}
