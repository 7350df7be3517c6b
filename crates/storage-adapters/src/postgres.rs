//! # PostgreSQL store
//!
//! This module implements the data mapping between the PostgreSQL relational
//! model and the `domains` entities. Counters are updated with single
//! `SET x = x + 1` statements, and a comment insert shares a transaction with
//! its board's `comment_count` bump.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    AccountId, AccountRepository, Author, Board, BoardChanges, BoardComment, BoardId, BoardImage,
    BoardRepository, BoardSummary, CommentId, CommentRepository, CommentView, DomainError,
    DomainResult, ImageId, NewBoard, NewComment, NewRegistration, NewUser, NewVisit, User,
    UserAccount, UserId, UserRepository, UserVisit, VisitId, VisitRepository,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

// Column lists are macros so `concat!` can splice them into query literals.
macro_rules! user_columns {
    () => {
        "u.id, u.username, u.nickname, u.profile_image, u.status, u.created_at, u.updated_at"
    };
}

macro_rules! account_columns {
    () => {
        "a.id, a.user_id, a.email, a.password_hash, a.last_login_at, a.login_count, \
         a.created_at, a.updated_at"
    };
}

macro_rules! board_columns {
    () => {
        "b.id, b.user_id, b.title, b.content, b.board_type, b.view_count, b.like_count, \
         b.comment_count, b.is_notice, b.is_deleted, b.deleted_at, b.created_at, b.updated_at"
    };
}

macro_rules! comment_columns {
    () => {
        "c.id, c.board_id, c.user_id, c.parent_id, c.content, c.like_count, c.is_deleted, \
         c.deleted_at, c.created_at, c.updated_at"
    };
}

/// Connection settings for [`PgStore::connect`].
#[derive(Debug, Clone)]
pub struct PgOptions {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(options: &PgOptions) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(&options.url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Unique violations become `Conflict`; everything else is logged and
/// surfaced as `Internal`.
fn db_err(err: sqlx::Error) -> DomainError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            let what = match db.constraint() {
                Some(c) if c.contains("email") => "email",
                Some(c) if c.contains("username") => "username",
                _ => "value",
            };
            return DomainError::Conflict(format!("{what} is already in use"));
        }
    }
    tracing::error!(error = %err, "database error");
    DomainError::internal(err)
}

fn decode_err(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        username: row.try_get("username")?,
        nickname: row.try_get("nickname")?,
        profile_image: row.try_get("profile_image")?,
        status: row.try_get::<String, _>("status")?.parse().map_err(decode_err)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn account_from_row(row: &PgRow) -> Result<UserAccount, sqlx::Error> {
    Ok(UserAccount {
        id: AccountId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        last_login_at: row.try_get("last_login_at")?,
        login_count: row.try_get("login_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn board_from_row(row: &PgRow) -> Result<Board, sqlx::Error> {
    Ok(Board {
        id: BoardId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        board_type: row.try_get::<String, _>("board_type")?.parse().map_err(decode_err)?,
        view_count: row.try_get("view_count")?,
        like_count: row.try_get("like_count")?,
        comment_count: row.try_get("comment_count")?,
        is_notice: row.try_get("is_notice")?,
        is_deleted: row.try_get("is_deleted")?,
        deleted_at: row.try_get("deleted_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn comment_from_row(row: &PgRow) -> Result<BoardComment, sqlx::Error> {
    Ok(BoardComment {
        id: CommentId(row.try_get("id")?),
        board_id: BoardId(row.try_get("board_id")?),
        user_id: UserId(row.try_get("user_id")?),
        parent_id: row.try_get::<Option<i64>, _>("parent_id")?.map(CommentId),
        content: row.try_get("content")?,
        like_count: row.try_get("like_count")?,
        is_deleted: row.try_get("is_deleted")?,
        deleted_at: row.try_get("deleted_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn image_from_row(row: &PgRow) -> Result<BoardImage, sqlx::Error> {
    Ok(BoardImage {
        id: ImageId(row.try_get("id")?),
        board_id: BoardId(row.try_get("board_id")?),
        image_url: row.try_get("image_url")?,
        image_name: row.try_get("image_name")?,
        image_size: row.try_get("image_size")?,
        mime_type: row.try_get("mime_type")?,
        order_num: row.try_get("order_num")?,
        created_at: row.try_get("created_at")?,
    })
}

fn visit_from_row(row: &PgRow) -> Result<UserVisit, sqlx::Error> {
    Ok(UserVisit {
        id: VisitId(row.try_get("id")?),
        user_id: row.try_get::<Option<i64>, _>("user_id")?.map(UserId),
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
        referrer: row.try_get("referrer")?,
        visited_at: row.try_get("visited_at")?,
    })
}

/// Reads the joined `author_id`/`author_username` pair.
fn author_from_row(row: &PgRow) -> Result<Author, sqlx::Error> {
    Ok(Author {
        id: UserId(row.try_get("author_id")?),
        username: row.try_get("author_username")?,
    })
}

fn summary_from_row(row: &PgRow) -> Result<BoardSummary, sqlx::Error> {
    Ok(BoardSummary { board: board_from_row(row)?, user: author_from_row(row)? })
}

fn comment_view_from_row(row: &PgRow) -> Result<CommentView, sqlx::Error> {
    Ok(CommentView { comment: comment_from_row(row)?, user: author_from_row(row)? })
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>> {
        sqlx::query(concat!("SELECT ", user_columns!(), " FROM users u WHERE u.id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(user_from_row).transpose())
            .map_err(db_err)
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        sqlx::query(concat!("SELECT ", user_columns!(), " FROM users u WHERE u.username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(user_from_row).transpose())
            .map_err(db_err)
    }

    async fn create(&self, user: NewUser) -> DomainResult<User> {
        sqlx::query(concat!(
            "INSERT INTO users AS u (username, nickname) VALUES ($1, $2) RETURNING ",
            user_columns!()
        ))
        .bind(&user.username)
        .bind(&user.nickname)
        .fetch_one(&self.pool)
        .await
        .and_then(|row| user_from_row(&row))
        .map_err(db_err)
    }
}

#[async_trait]
impl AccountRepository for PgStore {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<UserAccount>> {
        sqlx::query(concat!("SELECT ", account_columns!(), " FROM user_accounts a WHERE a.email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(account_from_row).transpose())
            .map_err(db_err)
    }

    async fn create_with_user(
        &self,
        registration: NewRegistration,
    ) -> DomainResult<(User, UserAccount)> {
        // A rejected account insert rolls the user row back with it.
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let user = sqlx::query(concat!(
            "INSERT INTO users AS u (username, nickname) VALUES ($1, $2) RETURNING ",
            user_columns!()
        ))
        .bind(&registration.user.username)
        .bind(&registration.user.nickname)
        .fetch_one(&mut *tx)
        .await
        .and_then(|row| user_from_row(&row))
        .map_err(db_err)?;

        let account = sqlx::query(concat!(
            "INSERT INTO user_accounts AS a (user_id, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING ",
            account_columns!()
        ))
        .bind(user.id.0)
        .bind(&registration.email)
        .bind(&registration.password_hash)
        .fetch_one(&mut *tx)
        .await
        .and_then(|row| account_from_row(&row))
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok((user, account))
    }

    async fn record_login(&self, id: AccountId, at: DateTime<Utc>) -> DomainResult<UserAccount> {
        let row = sqlx::query(concat!(
            "UPDATE user_accounts AS a SET last_login_at = $2, login_count = a.login_count + 1, \
             updated_at = $2 WHERE a.id = $1 RETURNING ",
            account_columns!()
        ))
        .bind(id.0)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("UserAccount", id))?;

        account_from_row(&row).map_err(db_err)
    }
}

#[async_trait]
impl BoardRepository for PgStore {
    async fn list(&self, limit: i64, offset: i64) -> DomainResult<Vec<BoardSummary>> {
        let rows = sqlx::query(concat!(
            "SELECT ",
            board_columns!(),
            ", u.id AS author_id, u.username AS author_username \
             FROM boards b JOIN users u ON u.id = b.user_id \
             WHERE b.is_deleted = FALSE \
             ORDER BY b.created_at DESC, b.id DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(summary_from_row).collect::<Result<_, _>>().map_err(db_err)
    }

    async fn count(&self) -> DomainResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM boards WHERE is_deleted = FALSE")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn find(&self, id: BoardId) -> DomainResult<Option<BoardSummary>> {
        sqlx::query(concat!(
            "SELECT ",
            board_columns!(),
            ", u.id AS author_id, u.username AS author_username \
             FROM boards b JOIN users u ON u.id = b.user_id \
             WHERE b.id = $1 AND b.is_deleted = FALSE"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .and_then(|row| row.as_ref().map(summary_from_row).transpose())
        .map_err(db_err)
    }

    async fn create(&self, board: NewBoard) -> DomainResult<Board> {
        // Inserts nothing when the author row is gone.
        let row = sqlx::query(concat!(
            "INSERT INTO boards AS b (user_id, title, content) \
             SELECT $1, $2, $3 WHERE EXISTS (SELECT 1 FROM users WHERE id = $1) RETURNING ",
            board_columns!()
        ))
        .bind(board.user_id.0)
        .bind(&board.title)
        .bind(&board.content)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("User", board.user_id))?;

        board_from_row(&row).map_err(db_err)
    }

    async fn update(
        &self,
        id: BoardId,
        changes: BoardChanges,
        at: DateTime<Utc>,
    ) -> DomainResult<Board> {
        let row = sqlx::query(concat!(
            "UPDATE boards AS b SET title = COALESCE($2, b.title), \
             content = COALESCE($3, b.content), updated_at = $4 \
             WHERE b.id = $1 AND b.is_deleted = FALSE RETURNING ",
            board_columns!()
        ))
        .bind(id.0)
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("Board", id))?;

        board_from_row(&row).map_err(db_err)
    }

    async fn soft_delete(&self, id: BoardId, at: DateTime<Utc>) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE boards SET is_deleted = TRUE, deleted_at = $2, updated_at = $2 \
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id.0)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Board", id));
        }
        Ok(())
    }

    async fn increment_view_count(&self, id: BoardId) -> DomainResult<i32> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE boards SET view_count = view_count + 1 \
             WHERE id = $1 AND is_deleted = FALSE RETURNING view_count",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("Board", id))
    }

    async fn list_images(&self, id: BoardId) -> DomainResult<Vec<BoardImage>> {
        let rows = sqlx::query(
            "SELECT id, board_id, image_url, image_name, image_size, mime_type, order_num, \
             created_at FROM board_images WHERE board_id = $1 ORDER BY order_num, id",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(image_from_row).collect::<Result<_, _>>().map_err(db_err)
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn list_top_level(&self, board_id: BoardId) -> DomainResult<Vec<CommentView>> {
        let rows = sqlx::query(concat!(
            "SELECT ",
            comment_columns!(),
            ", u.id AS author_id, u.username AS author_username \
             FROM board_comments c JOIN users u ON u.id = c.user_id \
             WHERE c.board_id = $1 AND c.is_deleted = FALSE AND c.parent_id IS NULL \
             ORDER BY c.created_at ASC, c.id ASC"
        ))
        .bind(board_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(comment_view_from_row).collect::<Result<_, _>>().map_err(db_err)
    }

    async fn list_replies(
        &self,
        board_id: BoardId,
        parent_ids: &[CommentId],
    ) -> DomainResult<Vec<CommentView>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let parents: Vec<i64> = parent_ids.iter().map(|id| id.0).collect();

        let rows = sqlx::query(concat!(
            "SELECT ",
            comment_columns!(),
            ", u.id AS author_id, u.username AS author_username \
             FROM board_comments c JOIN users u ON u.id = c.user_id \
             WHERE c.board_id = $1 AND c.is_deleted = FALSE AND c.parent_id = ANY($2) \
             ORDER BY c.created_at ASC, c.id ASC"
        ))
        .bind(board_id.0)
        .bind(&parents)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(comment_view_from_row).collect::<Result<_, _>>().map_err(db_err)
    }

    async fn find(&self, id: CommentId) -> DomainResult<Option<BoardComment>> {
        sqlx::query(concat!(
            "SELECT ",
            comment_columns!(),
            " FROM board_comments c WHERE c.id = $1 AND c.is_deleted = FALSE"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .and_then(|row| row.as_ref().map(comment_from_row).transpose())
        .map_err(db_err)
    }

    async fn create(&self, comment: NewComment) -> DomainResult<CommentView> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let bumped = sqlx::query(
            "UPDATE boards SET comment_count = comment_count + 1 \
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(comment.board_id.0)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        if bumped.rows_affected() == 0 {
            return Err(DomainError::not_found("Board", comment.board_id));
        }

        let row = sqlx::query(concat!(
            "WITH c AS (INSERT INTO board_comments (board_id, user_id, parent_id, content) \
             VALUES ($1, $2, $3, $4) RETURNING *) \
             SELECT ",
            comment_columns!(),
            ", u.id AS author_id, u.username AS author_username \
             FROM c JOIN users u ON u.id = c.user_id"
        ))
        .bind(comment.board_id.0)
        .bind(comment.user_id.0)
        .bind(comment.parent_id.map(|p| p.0))
        .bind(&comment.content)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        let created = comment_view_from_row(&row).map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(created)
    }
}

#[async_trait]
impl VisitRepository for PgStore {
    async fn record(&self, visit: NewVisit) -> DomainResult<UserVisit> {
        let row = sqlx::query(
            "INSERT INTO user_visits (user_id, ip_address, user_agent, referrer) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, ip_address, user_agent, referrer, visited_at",
        )
        .bind(visit.user_id.map(|u| u.0))
        .bind(&visit.ip_address)
        .bind(&visit.user_agent)
        .bind(&visit.referrer)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        visit_from_row(&row).map_err(db_err)
    }
}
