//! SQLite backend for the shelfwatch alert store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. The schema enforces the
//! at-most-one-active-alert invariants with partial unique indexes as a
//! backstop behind the engine's per-shelf serialisation.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{AuditMode, SqliteStore};
