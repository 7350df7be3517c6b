//! # auth-adapters
//!
//! Argon2 password hashing and signed session tokens.

pub mod password;

#[cfg(feature = "auth-jwt")]
pub mod session;

pub use password::Argon2PasswordHasher;

#[cfg(feature = "auth-jwt")]
pub use session::JwtSessionCodec;
