pub mod auth;
pub mod boards;
pub mod comments;
pub mod system;
