//! # CommentService
//!
//! Reads a board's comments as a two-level tree and creates new comments.
//! Nesting is a fixed business rule of one level: replies may only target a
//! live top-level comment on the same board.

use std::sync::Arc;

use domains::{
    BoardId, BoardRepository, CommentId, CommentNode, CommentRepository, CommentView,
    DomainError, DomainResult, NewComment, Session,
};

use crate::{comment_tree, validation};

pub struct CommentService {
    boards: Arc<dyn BoardRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(boards: Arc<dyn BoardRepository>, comments: Arc<dyn CommentRepository>) -> Self {
        Self { boards, comments }
    }

    /// Top-level comments oldest first, each with its replies oldest first.
    pub async fn list_comments(&self, board_id: BoardId) -> DomainResult<Vec<CommentNode>> {
        let top_level = self.comments.list_top_level(board_id).await?;
        if top_level.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<CommentId> = top_level.iter().map(|c| c.comment.id).collect();
        let replies = self.comments.list_replies(board_id, &ids).await?;

        Ok(comment_tree::assemble(top_level, replies))
    }

    pub async fn create_comment(
        &self,
        board_id: BoardId,
        session: &Session,
        content: &str,
        parent_id: Option<CommentId>,
    ) -> DomainResult<CommentView> {
        if self.boards.find(board_id).await?.is_none() {
            return Err(DomainError::not_found("Board", board_id));
        }

        let content = validation::required("content", content)?;

        if let Some(parent_id) = parent_id {
            self.check_parent(board_id, parent_id).await?;
        }

        let created = self
            .comments
            .create(NewComment { board_id, user_id: session.user_id, parent_id, content })
            .await?;

        tracing::info!(
            comment_id = %created.comment.id,
            board_id = %board_id,
            parent_id = ?parent_id.map(|p| p.0),
            user_id = %session.user_id,
            "comment created"
        );
        Ok(created)
    }

    async fn check_parent(&self, board_id: BoardId, parent_id: CommentId) -> DomainResult<()> {
        let parent = self
            .comments
            .find(parent_id)
            .await?
            .ok_or_else(|| DomainError::validation(format!("parent comment {parent_id} does not exist")))?;

        if parent.board_id != board_id {
            return Err(DomainError::validation("parent comment belongs to another board"));
        }
        if parent.is_reply() {
            return Err(DomainError::validation("replies cannot be nested more than one level"));
        }
        Ok(())
    }
}
