//! Schema migrations for the local store.
//!
//! The runner executes on every database open; each migration is guarded by
//! the `user_version` pragma, so it applies exactly once per database file.

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Latest schema version.  Bump alongside each new migration module.
const CURRENT_VERSION: u32 = 1;

/// Bring the connected database up to [`CURRENT_VERSION`], applying any
/// outstanding migrations in order.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::debug!(
        current_version = current,
        target_version = CURRENT_VERSION,
        "checking database migrations"
    );

    if current < 1 {
        tracing::info!("applying migration v001_initial");
        v001_initial::up(conn).map_err(|e| StoreError::Migration(e.to_string()))?;
        conn.pragma_update(None, "user_version", 1)?;
    }

    // future migrations follow the same pattern:
    // if current < 2 { v002_xxx::up(conn)?; ... }

    Ok(())
}
