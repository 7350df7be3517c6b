//! Storage backends for the community board.
//!
//! `memory` is always available; the PostgreSQL store sits behind the
//! `db-postgres` feature.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::{PgOptions, PgStore};
