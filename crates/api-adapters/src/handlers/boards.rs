//! `/api/boards` handlers.

use axum::{extract::State, http::StatusCode, Json};
use domains::{Board, BoardDetail, BoardId, BoardPage, DomainError};
use serde::Deserialize;
use services::{DEFAULT_LIMIT, DEFAULT_PAGE};

use crate::envelope::ApiResponse;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentSession};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBoardRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBoardRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

pub async fn list_boards(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<ApiResponse<BoardPage>>, ApiError> {
    let page = params.page.unwrap_or(DEFAULT_PAGE);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let boards = state.boards.list_boards(page, limit).await?;
    Ok(Json(ApiResponse::ok(boards)))
}

pub async fn get_board(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<BoardDetail>>, ApiError> {
    let id = BoardId(id);
    let detail = state
        .boards
        .get_board_detail(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Board", id))?;
    Ok(Json(ApiResponse::ok(detail)))
}

pub async fn create_board(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiJson(body): ApiJson<CreateBoardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Board>>), ApiError> {
    let board = state.boards.create_board(&session, &body.title, &body.content).await?;
    state.metrics.post_created();
    Ok((StatusCode::CREATED, Json(ApiResponse::ok_with_message(board, "board created"))))
}

pub async fn update_board(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateBoardRequest>,
) -> Result<Json<ApiResponse<Board>>, ApiError> {
    let board = state
        .boards
        .update_board(BoardId(id), &session, body.title.as_deref(), body.content.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok_with_message(board, "board updated")))
}

pub async fn delete_board(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.boards.delete_board(BoardId(id), &session).await?;
    Ok(Json(ApiResponse::message("board deleted")))
}
