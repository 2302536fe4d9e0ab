//! # podium-store
//!
//! Local fallback storage for the Podium client, backed by SQLite.
//!
//! When no backend is configured (and for the session-restore cache even when
//! one is), application state is persisted as JSON collections in a single
//! key/value table.  The crate exposes a synchronous [`Database`] handle that
//! wraps a `rusqlite::Connection` and provides typed load/save helpers for
//! every collection.

pub mod competitions;
pub mod database;
pub mod media;
pub mod migrations;
pub mod profile;
pub mod votes;

mod error;

pub use database::Database;
pub use error::StoreError;
