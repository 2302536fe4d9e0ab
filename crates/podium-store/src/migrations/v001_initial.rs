//! v001 -- Initial schema creation.
//!
//! Creates the single `local_state` table.  Application state is stored as
//! one JSON document per well-known key, mirroring the shape the client
//! keeps in memory.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Local state (one JSON document per collection)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS local_state (
    key        TEXT PRIMARY KEY NOT NULL,   -- 'profile', 'competitions', ...
    value      TEXT NOT NULL,               -- JSON document
    updated_at TEXT NOT NULL                -- ISO-8601 / RFC-3339
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
