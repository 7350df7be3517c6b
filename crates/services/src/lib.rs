//! # services
//!
//! Business logic of the community board. Depends only on `domains`: every
//! collaborator arrives as a port trait object, so the same services run over
//! PostgreSQL in production and the in-memory store in tests.

pub mod auth;
pub mod boards;
pub mod comment_tree;
pub mod comments;
pub mod validation;

pub use auth::{AuthService, LoginOutcome, INVALID_CREDENTIALS};
pub use boards::{BoardService, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use comments::CommentService;
