//! # Core Traits (Ports)
//!
//! Any storage or auth adapter must implement these traits to be wired into
//! the services. Reads never return soft-deleted rows.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::errors::DomainResult;
use crate::models::{
    AccountId, Board, BoardChanges, BoardComment, BoardId, BoardImage, BoardSummary, CommentId,
    CommentView, NewBoard, NewComment, NewRegistration, NewUser, NewVisit, Session, User,
    UserAccount, UserId, UserVisit,
};

/// Persistence contract for user identities.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    /// Fails with `Conflict` if the username is taken.
    async fn create(&self, user: NewUser) -> DomainResult<User>;
}

/// Persistence contract for credentials.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<UserAccount>>;
    /// Creates the user and its account as one unit. Fails with `Conflict`
    /// if the email or the username is taken, and then writes nothing.
    async fn create_with_user(
        &self,
        registration: NewRegistration,
    ) -> DomainResult<(User, UserAccount)>;
    /// Sets `last_login_at` and bumps `login_count` in one step.
    async fn record_login(&self, id: AccountId, at: DateTime<Utc>) -> DomainResult<UserAccount>;
}

/// Persistence contract for posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Newest first, ties broken by id descending.
    async fn list(&self, limit: i64, offset: i64) -> DomainResult<Vec<BoardSummary>>;
    async fn count(&self) -> DomainResult<i64>;
    async fn find(&self, id: BoardId) -> DomainResult<Option<BoardSummary>>;
    async fn create(&self, board: NewBoard) -> DomainResult<Board>;
    async fn update(
        &self,
        id: BoardId,
        changes: BoardChanges,
        at: DateTime<Utc>,
    ) -> DomainResult<Board>;
    async fn soft_delete(&self, id: BoardId, at: DateTime<Utc>) -> DomainResult<()>;
    /// Atomic `view_count + 1`; returns the new count.
    async fn increment_view_count(&self, id: BoardId) -> DomainResult<i32>;
    /// Ordered by `order_num`, then id.
    async fn list_images(&self, id: BoardId) -> DomainResult<Vec<BoardImage>>;
}

/// Persistence contract for comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Comments without a parent, oldest first.
    async fn list_top_level(&self, board_id: BoardId) -> DomainResult<Vec<CommentView>>;
    /// Comments whose parent is one of `parent_ids`, oldest first.
    async fn list_replies(
        &self,
        board_id: BoardId,
        parent_ids: &[CommentId],
    ) -> DomainResult<Vec<CommentView>>;
    async fn find(&self, id: CommentId) -> DomainResult<Option<BoardComment>>;
    /// Inserts the comment and bumps the board's `comment_count` as one unit.
    async fn create(&self, comment: NewComment) -> DomainResult<CommentView>;
}

/// Append-only visit log.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait VisitRepository: Send + Sync {
    async fn record(&self, visit: NewVisit) -> DomainResult<UserVisit>;
}

/// One-way password hashing.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> DomainResult<String>;
    /// `Ok(false)` on mismatch or an unparsable hash.
    async fn verify(&self, password: &str, hash: &str) -> DomainResult<bool>;
}

/// Turns a [`Session`] into a signed, expiring token and back.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SessionCodec: Send + Sync {
    fn issue(&self, session: &Session) -> DomainResult<String>;
    /// `None` for a malformed, tampered or expired token.
    fn decode(&self, token: &str) -> Option<Session>;
    fn ttl(&self) -> Duration;
}
