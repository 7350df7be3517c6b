//! # In-memory store
//!
//! A `dashmap`-backed implementation of every repository port. Used by the
//! test suites and by `database.backend = "memory"` for local runs without
//! PostgreSQL. Uniqueness of usernames and emails is enforced through
//! secondary index maps whose `entry` API makes check-and-insert atomic.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    AccountId, AccountRepository, Author, Board, BoardChanges, BoardComment, BoardId, BoardImage,
    BoardRepository, BoardSummary, BoardType, CommentId, CommentRepository, CommentView,
    DomainError, DomainResult, ImageId, NewBoard, NewComment, NewRegistration, NewUser, NewVisit, User,
    UserAccount, UserId, UserRepository, UserStatus, UserVisit, VisitId, VisitRepository,
};

#[derive(Default)]
struct Sequences {
    user: AtomicI64,
    account: AtomicI64,
    board: AtomicI64,
    comment: AtomicI64,
    image: AtomicI64,
    visit: AtomicI64,
}

fn next(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, Ordering::Relaxed) + 1
}

fn clamp(n: i64) -> usize {
    usize::try_from(n).unwrap_or(if n < 0 { 0 } else { usize::MAX })
}

#[derive(Default)]
pub struct MemoryStore {
    seq: Sequences,
    users: DashMap<UserId, User>,
    usernames: DashMap<String, UserId>,
    accounts: DashMap<AccountId, UserAccount>,
    emails: DashMap<String, AccountId>,
    boards: DashMap<BoardId, Board>,
    comments: DashMap<CommentId, BoardComment>,
    images: DashMap<ImageId, BoardImage>,
    visits: DashMap<VisitId, UserVisit>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an image row to a board. The HTTP API never writes images.
    pub fn insert_image(&self, board_id: BoardId, image_url: &str, order_num: i32) -> BoardImage {
        let image = BoardImage {
            id: ImageId(next(&self.seq.image)),
            board_id,
            image_url: image_url.to_string(),
            image_name: None,
            image_size: None,
            mime_type: None,
            order_num,
            created_at: Utc::now(),
        };
        self.images.insert(image.id, image.clone());
        image
    }

    /// Raw row access, including soft-deleted boards.
    pub fn board_row(&self, id: BoardId) -> Option<Board> {
        self.boards.get(&id).map(|b| b.clone())
    }

    pub fn visit_count(&self) -> usize {
        self.visits.len()
    }

    /// Callers must hold the vacant `usernames` slot for this name.
    fn insert_user(&self, user: NewUser) -> User {
        let now = Utc::now();
        let created = User {
            id: UserId(next(&self.seq.user)),
            username: user.username,
            nickname: user.nickname,
            profile_image: None,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(created.id, created.clone());
        created
    }

    fn author(&self, id: UserId) -> Option<Author> {
        self.users
            .get(&id)
            .map(|u| Author { id: u.id, username: u.username.clone() })
    }

    fn summarize(&self, board: Board) -> Option<BoardSummary> {
        let user = self.author(board.user_id)?;
        Some(BoardSummary { board, user })
    }

    fn view(&self, comment: BoardComment) -> Option<CommentView> {
        let user = self.author(comment.user_id)?;
        Some(CommentView { comment, user })
    }

    fn live_comments(&self, keep: impl Fn(&BoardComment) -> bool) -> Vec<CommentView> {
        let mut rows: Vec<BoardComment> = self
            .comments
            .iter()
            .filter(|c| !c.is_deleted && keep(c.value()))
            .map(|c| c.clone())
            .collect();
        rows.sort_by_key(|c| (c.created_at, c.id));
        rows.into_iter().filter_map(|c| self.view(c)).collect()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let Some(id) = self.usernames.get(username).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let slot = match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => {
                return Err(DomainError::Conflict("username is already in use".into()))
            }
            Entry::Vacant(slot) => slot,
        };

        let created = self.insert_user(user);
        slot.insert(created.id);
        Ok(created)
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<UserAccount>> {
        let Some(id) = self.emails.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn create_with_user(
        &self,
        registration: NewRegistration,
    ) -> DomainResult<(User, UserAccount)> {
        // Both index slots stay reserved until the rows exist. Lock order is
        // emails, then usernames.
        let email_slot = match self.emails.entry(registration.email.clone()) {
            Entry::Occupied(_) => {
                return Err(DomainError::Conflict("email is already in use".into()))
            }
            Entry::Vacant(slot) => slot,
        };
        let username_slot = match self.usernames.entry(registration.user.username.clone()) {
            Entry::Occupied(_) => {
                return Err(DomainError::Conflict("username is already in use".into()))
            }
            Entry::Vacant(slot) => slot,
        };

        let user = self.insert_user(registration.user);
        let now = Utc::now();
        let account = UserAccount {
            id: AccountId(next(&self.seq.account)),
            user_id: user.id,
            email: registration.email,
            password_hash: Some(registration.password_hash),
            last_login_at: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.accounts.insert(account.id, account.clone());

        username_slot.insert(user.id);
        email_slot.insert(account.id);
        Ok((user, account))
    }

    async fn record_login(&self, id: AccountId, at: DateTime<Utc>) -> DomainResult<UserAccount> {
        let mut account = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("UserAccount", id))?;
        account.last_login_at = Some(at);
        account.login_count += 1;
        account.updated_at = at;
        Ok(account.clone())
    }
}

#[async_trait]
impl BoardRepository for MemoryStore {
    async fn list(&self, limit: i64, offset: i64) -> DomainResult<Vec<BoardSummary>> {
        let mut live: Vec<Board> = self
            .boards
            .iter()
            .filter(|b| !b.is_deleted)
            .map(|b| b.clone())
            .collect();
        live.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(live
            .into_iter()
            .skip(clamp(offset))
            .take(clamp(limit))
            .filter_map(|b| self.summarize(b))
            .collect())
    }

    async fn count(&self) -> DomainResult<i64> {
        Ok(self.boards.iter().filter(|b| !b.is_deleted).count() as i64)
    }

    async fn find(&self, id: BoardId) -> DomainResult<Option<BoardSummary>> {
        let board = self.boards.get(&id).filter(|b| !b.is_deleted).map(|b| b.clone());
        Ok(board.and_then(|b| self.summarize(b)))
    }

    async fn create(&self, board: NewBoard) -> DomainResult<Board> {
        if !self.users.contains_key(&board.user_id) {
            return Err(DomainError::not_found("User", board.user_id));
        }

        let now = Utc::now();
        let created = Board {
            id: BoardId(next(&self.seq.board)),
            user_id: board.user_id,
            title: board.title,
            content: board.content,
            board_type: BoardType::General,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            is_notice: false,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.boards.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: BoardId,
        changes: BoardChanges,
        at: DateTime<Utc>,
    ) -> DomainResult<Board> {
        let mut board = self
            .boards
            .get_mut(&id)
            .filter(|b| !b.is_deleted)
            .ok_or_else(|| DomainError::not_found("Board", id))?;
        if let Some(title) = changes.title {
            board.title = title;
        }
        if let Some(content) = changes.content {
            board.content = content;
        }
        board.updated_at = at;
        Ok(board.clone())
    }

    async fn soft_delete(&self, id: BoardId, at: DateTime<Utc>) -> DomainResult<()> {
        let mut board = self
            .boards
            .get_mut(&id)
            .filter(|b| !b.is_deleted)
            .ok_or_else(|| DomainError::not_found("Board", id))?;
        board.is_deleted = true;
        board.deleted_at = Some(at);
        board.updated_at = at;
        Ok(())
    }

    async fn increment_view_count(&self, id: BoardId) -> DomainResult<i32> {
        let mut board = self
            .boards
            .get_mut(&id)
            .filter(|b| !b.is_deleted)
            .ok_or_else(|| DomainError::not_found("Board", id))?;
        board.view_count += 1;
        Ok(board.view_count)
    }

    async fn list_images(&self, id: BoardId) -> DomainResult<Vec<BoardImage>> {
        let mut images: Vec<BoardImage> = self
            .images
            .iter()
            .filter(|i| i.board_id == id)
            .map(|i| i.clone())
            .collect();
        images.sort_by_key(|i| (i.order_num, i.id));
        Ok(images)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn list_top_level(&self, board_id: BoardId) -> DomainResult<Vec<CommentView>> {
        Ok(self.live_comments(|c| c.board_id == board_id && c.parent_id.is_none()))
    }

    async fn list_replies(
        &self,
        board_id: BoardId,
        parent_ids: &[CommentId],
    ) -> DomainResult<Vec<CommentView>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let parents: HashSet<CommentId> = parent_ids.iter().copied().collect();
        Ok(self.live_comments(|c| {
            c.board_id == board_id && c.parent_id.is_some_and(|p| parents.contains(&p))
        }))
    }

    async fn find(&self, id: CommentId) -> DomainResult<Option<BoardComment>> {
        Ok(self.comments.get(&id).filter(|c| !c.is_deleted).map(|c| c.clone()))
    }

    async fn create(&self, comment: NewComment) -> DomainResult<CommentView> {
        let author = self
            .author(comment.user_id)
            .ok_or_else(|| DomainError::not_found("User", comment.user_id))?;

        // The board guard is held across the insert so the count and the
        // comment row change together.
        let mut board = self
            .boards
            .get_mut(&comment.board_id)
            .filter(|b| !b.is_deleted)
            .ok_or_else(|| DomainError::not_found("Board", comment.board_id))?;

        let now = Utc::now();
        let created = BoardComment {
            id: CommentId(next(&self.seq.comment)),
            board_id: comment.board_id,
            user_id: comment.user_id,
            parent_id: comment.parent_id,
            content: comment.content,
            like_count: 0,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.comments.insert(created.id, created.clone());
        board.comment_count += 1;

        Ok(CommentView { comment: created, user: author })
    }
}

#[async_trait]
impl VisitRepository for MemoryStore {
    async fn record(&self, visit: NewVisit) -> DomainResult<UserVisit> {
        let recorded = UserVisit {
            id: VisitId(next(&self.seq.visit)),
            user_id: visit.user_id,
            ip_address: visit.ip_address,
            user_agent: visit.user_agent,
            referrer: visit.referrer,
            visited_at: Utc::now(),
        };
        self.visits.insert(recorded.id, recorded.clone());
        Ok(recorded)
    }
}
