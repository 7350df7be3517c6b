//! # Domain Models
//!
//! These structs represent the core entities of the community board and the
//! read-side projections the services hand to the API layer.
//! Ids are database-assigned 64-bit integers wrapped in newtypes so a
//! `BoardId` can never be passed where a `CommentId` is expected.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

id_type!(UserId);
id_type!(AccountId);
id_type!(BoardId);
id_type!(CommentId);
id_type!(ImageId);
id_type!(VisitId);

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Suspended => "SUSPENDED",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            "SUSPENDED" => Ok(Self::Suspended),
            other => Err(format!("unknown user status '{other}'")),
        }
    }
}

/// Category of a post. Only `General` is produced by the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardType {
    #[default]
    General,
    Notice,
    Qna,
    Gallery,
}

impl BoardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::Notice => "NOTICE",
            Self::Qna => "QNA",
            Self::Gallery => "GALLERY",
        }
    }
}

impl FromStr for BoardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GENERAL" => Ok(Self::General),
            "NOTICE" => Ok(Self::Notice),
            "QNA" => Ok(Self::Qna),
            "GALLERY" => Ok(Self::Gallery),
            other => Err(format!("unknown board type '{other}'")),
        }
    }
}

// ─── Entities ────────────────────────────────────────────────────────────────

/// Identity anchor created at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub nickname: Option<String>,
    pub profile_image: Option<String>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Credentials and login bookkeeping, 1:1 with [`User`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: AccountId,
    pub user_id: UserId,
    pub email: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub login_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVisit {
    pub id: VisitId,
    pub user_id: Option<UserId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub visited_at: DateTime<Utc>,
}

/// A post. Never hard-deleted; `is_deleted` hides it from every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub board_type: BoardType,
    pub view_count: i32,
    pub like_count: i32,
    pub comment_count: i32,
    pub is_notice: bool,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment on a board. `parent_id` points at a top-level comment of the
/// same board; replies are never nested deeper than one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardComment {
    pub id: CommentId,
    pub board_id: BoardId,
    pub user_id: UserId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub like_count: i32,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoardComment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardImage {
    pub id: ImageId,
    pub board_id: BoardId,
    pub image_url: String,
    pub image_name: Option<String>,
    pub image_size: Option<i32>,
    pub mime_type: Option<String>,
    pub order_num: i32,
    pub created_at: DateTime<Utc>,
}

/// The identity carried by the session cookie. Not persisted server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
}

// ─── Read projections ────────────────────────────────────────────────────────

/// The public face of a user, joined onto boards and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSummary {
    #[serde(flatten)]
    pub board: Board,
    pub user: Author,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub user: Author,
    pub images: Vec<BoardImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: BoardComment,
    pub user: Author,
}

/// A top-level comment with its direct replies, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// `total_pages = ceil(total / limit)`; zero when `limit` is not positive.
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 {
            total / limit + i64::from(total % limit != 0)
        } else {
            0
        };
        Self { page, limit, total, total_pages }
    }

    /// Row offset of this page, or `None` when the page can hold no rows.
    pub fn offset(&self) -> Option<i64> {
        if self.page < 1 || self.limit < 1 {
            return None;
        }
        (self.page - 1).checked_mul(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardPage {
    pub boards: Vec<BoardSummary>,
    pub pagination: Pagination,
}

/// Returned by a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

// ─── Write models ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub nickname: Option<String>,
}

/// A user and its credentials, written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub user: NewUser,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBoard {
    pub user_id: UserId,
    pub title: String,
    pub content: String,
}

/// Partial update of a board; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub board_id: BoardId,
    pub user_id: UserId,
    pub parent_id: Option<CommentId>,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewVisit {
    pub user_id: Option<UserId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}
