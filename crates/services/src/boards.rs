//! # BoardService
//!
//! Listing, detail, and owner-gated mutation of posts.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    Board, BoardChanges, BoardDetail, BoardId, BoardPage, BoardRepository, DomainError,
    DomainResult, NewBoard, Pagination, Session,
};

use crate::validation;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

pub struct BoardService {
    boards: Arc<dyn BoardRepository>,
}

impl BoardService {
    pub fn new(boards: Arc<dyn BoardRepository>) -> Self {
        Self { boards }
    }

    /// One page of live boards, newest first. Out-of-range pages are empty
    /// rather than an error.
    pub async fn list_boards(&self, page: i64, limit: i64) -> DomainResult<BoardPage> {
        let total = self.boards.count().await?;
        let pagination = Pagination::new(page, limit, total);

        let boards = match pagination.offset() {
            Some(offset) if offset < total => self.boards.list(limit, offset).await?,
            _ => Vec::new(),
        };

        Ok(BoardPage { boards, pagination })
    }

    /// Returns `None` for absent or deleted boards. Every hit bumps the view
    /// count, with no de-duplication per reader.
    pub async fn get_board_detail(&self, id: BoardId) -> DomainResult<Option<BoardDetail>> {
        let Some(summary) = self.boards.find(id).await? else {
            return Ok(None);
        };

        let mut board = summary.board;
        board.view_count = self.boards.increment_view_count(id).await?;
        let images = self.boards.list_images(id).await?;

        Ok(Some(BoardDetail { board, user: summary.user, images }))
    }

    pub async fn create_board(
        &self,
        session: &Session,
        title: &str,
        content: &str,
    ) -> DomainResult<Board> {
        let title = validation::title(title)?;
        let content = validation::required("content", content)?;

        let board = self
            .boards
            .create(NewBoard { user_id: session.user_id, title, content })
            .await?;

        tracing::info!(board_id = %board.id, user_id = %session.user_id, "board created");
        Ok(board)
    }

    /// Applies the provided fields; omitted fields keep their stored value.
    pub async fn update_board(
        &self,
        id: BoardId,
        session: &Session,
        title: Option<&str>,
        content: Option<&str>,
    ) -> DomainResult<Board> {
        let board = self.owned_board(id, session, "edit").await?;

        let changes = BoardChanges {
            title: title.map(validation::title).transpose()?,
            content: content
                .map(|c| validation::required("content", c))
                .transpose()?,
        };
        if changes == BoardChanges::default() {
            return Ok(board);
        }

        let updated = self.boards.update(id, changes, Utc::now()).await?;
        tracing::info!(board_id = %id, user_id = %session.user_id, "board updated");
        Ok(updated)
    }

    /// Logical delete: the row stays, every read skips it.
    pub async fn delete_board(&self, id: BoardId, session: &Session) -> DomainResult<()> {
        self.owned_board(id, session, "delete").await?;
        self.boards.soft_delete(id, Utc::now()).await?;
        tracing::info!(board_id = %id, user_id = %session.user_id, "board deleted");
        Ok(())
    }

    async fn owned_board(&self, id: BoardId, session: &Session, action: &str) -> DomainResult<Board> {
        let summary = self
            .boards
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Board", id))?;

        if summary.board.user_id != session.user_id {
            tracing::warn!(board_id = %id, user_id = %session.user_id, action, "not the board owner");
            return Err(DomainError::Forbidden(format!("not allowed to {action} this board")));
        }
        Ok(summary.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{Author, BoardSummary, BoardType, MockBoardRepository, UserId};
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    fn summary(id: i64, owner: i64) -> BoardSummary {
        let now = Utc::now();
        BoardSummary {
            board: Board {
                id: BoardId(id),
                user_id: UserId(owner),
                title: format!("post {id}"),
                content: "body".into(),
                board_type: BoardType::General,
                view_count: 4,
                like_count: 0,
                comment_count: 0,
                is_notice: false,
                is_deleted: false,
                deleted_at: None,
                created_at: now,
                updated_at: now,
            },
            user: Author { id: UserId(owner), username: format!("user{owner}") },
        }
    }

    fn session(user: i64) -> Session {
        Session {
            user_id: UserId(user),
            username: format!("user{user}"),
            email: format!("user{user}@example.com"),
        }
    }

    #[tokio::test]
    async fn list_computes_offset_and_total_pages() {
        let mut repo = MockBoardRepository::new();
        repo.expect_count().returning(|| Ok(25));
        repo.expect_list()
            .with(eq(10), eq(10))
            .returning(|_, _| Ok((11..=20).rev().map(|i| summary(i, 1)).collect()));

        let svc = BoardService::new(Arc::new(repo));
        let page = assert_ok!(svc.list_boards(2, 10).await);

        assert_eq!(page.boards.len(), 10);
        assert_eq!(page.pagination.total, 25);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.page, 2);
    }

    #[tokio::test]
    async fn list_out_of_range_pages_are_empty() {
        let mut repo = MockBoardRepository::new();
        repo.expect_count().returning(|| Ok(5));
        repo.expect_list().never();

        let svc = BoardService::new(Arc::new(repo));
        for (page, limit) in [(0, 10), (-1, 10), (1, 0), (9, 10), (i64::MAX, 10)] {
            let result = assert_ok!(svc.list_boards(page, limit).await);
            assert!(result.boards.is_empty(), "page {page} limit {limit}");
            assert_eq!(result.pagination.total, 5);
        }
    }

    #[tokio::test]
    async fn detail_bumps_view_count() {
        let mut repo = MockBoardRepository::new();
        repo.expect_find().returning(|id| Ok(Some(summary(id.0, 1))));
        repo.expect_increment_view_count()
            .times(1)
            .with(eq(BoardId(3)))
            .returning(|_| Ok(5));
        repo.expect_list_images().returning(|_| Ok(vec![]));

        let svc = BoardService::new(Arc::new(repo));
        let detail = assert_ok!(svc.get_board_detail(BoardId(3)).await).unwrap();
        assert_eq!(detail.board.view_count, 5);
        assert_eq!(detail.user.username, "user1");
    }

    #[tokio::test]
    async fn detail_of_missing_board_is_none_without_side_effects() {
        let mut repo = MockBoardRepository::new();
        repo.expect_find().returning(|_| Ok(None));
        repo.expect_increment_view_count().never();

        let svc = BoardService::new(Arc::new(repo));
        assert_eq!(assert_ok!(svc.get_board_detail(BoardId(9)).await), None);
    }

    #[tokio::test]
    async fn create_trims_and_requires_fields() {
        let mut repo = MockBoardRepository::new();
        repo.expect_create()
            .withf(|b| b.title == "Hi" && b.content == "there" && b.user_id == UserId(2))
            .returning(|b| {
                let mut s = summary(1, b.user_id.0);
                s.board.title = b.title;
                s.board.content = b.content;
                Ok(s.board)
            });

        let svc = BoardService::new(Arc::new(repo));
        let board = assert_ok!(svc.create_board(&session(2), "  Hi ", " there ").await);
        assert_eq!(board.title, "Hi");

        let err = assert_err!(svc.create_board(&session(2), " ", "x").await);
        assert!(matches!(err, DomainError::Validation(_)));
        let err = assert_err!(svc.create_board(&session(2), "x", "").await);
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn non_owner_cannot_update_or_delete() {
        let mut repo = MockBoardRepository::new();
        repo.expect_find().returning(|id| Ok(Some(summary(id.0, 1))));
        repo.expect_update().never();
        repo.expect_soft_delete().never();

        let svc = BoardService::new(Arc::new(repo));
        let err = assert_err!(svc.update_board(BoardId(1), &session(2), Some("t"), None).await);
        assert!(matches!(err, DomainError::Forbidden(_)));
        let err = assert_err!(svc.delete_board(BoardId(1), &session(2)).await);
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn missing_board_is_not_found_for_mutations() {
        let mut repo = MockBoardRepository::new();
        repo.expect_find().returning(|_| Ok(None));

        let svc = BoardService::new(Arc::new(repo));
        let err = assert_err!(svc.update_board(BoardId(1), &session(1), Some("t"), None).await);
        assert!(matches!(err, DomainError::NotFound("Board", _)));
        let err = assert_err!(svc.delete_board(BoardId(1), &session(1)).await);
        assert!(matches!(err, DomainError::NotFound("Board", _)));
    }

    #[tokio::test]
    async fn owner_update_passes_only_provided_fields() {
        let mut repo = MockBoardRepository::new();
        repo.expect_find().returning(|id| Ok(Some(summary(id.0, 1))));
        repo.expect_update()
            .times(1)
            .withf(|id, changes, _| {
                *id == BoardId(1)
                    && changes.title.as_deref() == Some("new")
                    && changes.content.is_none()
            })
            .returning(|_, changes, _| {
                let mut s = summary(1, 1);
                s.board.title = changes.title.unwrap_or_default();
                Ok(s.board)
            });

        let svc = BoardService::new(Arc::new(repo));
        let board = assert_ok!(svc.update_board(BoardId(1), &session(1), Some(" new "), None).await);
        assert_eq!(board.title, "new");
    }

    #[tokio::test]
    async fn owner_delete_is_soft() {
        let mut repo = MockBoardRepository::new();
        repo.expect_find().returning(|id| Ok(Some(summary(id.0, 1))));
        repo.expect_soft_delete()
            .times(1)
            .withf(|id, _| *id == BoardId(1))
            .returning(|_, _| Ok(()));

        let svc = BoardService::new(Arc::new(repo));
        assert_ok!(svc.delete_board(BoardId(1), &session(1)).await);
    }
}
