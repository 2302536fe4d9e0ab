//! Database connection management and the raw key/value state table.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees
//! that migrations are run before any other operation.  State is stored as
//! one JSON document per well-known key; the typed helpers in the sibling
//! modules are the preferred way to touch them.

use std::path::{Path, PathBuf};

use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection};

use crate::error::{Result, StoreError};
use crate::migrations;

/// State key holding the current user profile.
pub const KEY_PROFILE: &str = "profile";

/// State key holding the competitions collection.
pub const KEY_COMPETITIONS: &str = "competitions";

/// State key holding the media file collection.
pub const KEY_MEDIA_FILES: &str = "media_files";

/// State key holding the composite vote keys.
pub const KEY_VOTES: &str = "votes";

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/podium/podium.db`
    /// - macOS:   `~/Library/Application Support/com.podium.podium/podium.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\podium\podium\data\podium.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "podium", "podium").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("podium.db");

        tracing::info!(path = %db_path.display(), "opening local store");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// This is useful for tests and for embedding the store inside custom
    /// directory layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed collection helpers, but direct access
    /// is occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    // ------------------------------------------------------------------
    // Raw state access
    // ------------------------------------------------------------------

    /// Read the raw JSON document stored under `key`, if any.
    pub fn read_state(&self, key: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT value FROM local_state WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Write (insert or replace) the JSON document stored under `key`.
    pub fn write_state(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO local_state (key, value, updated_at)
             VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Delete the document stored under `key`.  Returns `true` if a row was
    /// deleted.
    pub fn clear_state(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM local_state WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_db(dir: &tempfile::TempDir) -> Database {
        Database::open_at(&dir.path().join("test.db")).expect("should open")
    }

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);
        assert!(db.path().is_some());
    }

    #[test]
    fn state_write_read_overwrite_clear() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        assert_eq!(db.read_state("missing").unwrap(), None);

        db.write_state(KEY_VOTES, "[\"a\"]").unwrap();
        assert_eq!(db.read_state(KEY_VOTES).unwrap().as_deref(), Some("[\"a\"]"));

        db.write_state(KEY_VOTES, "[\"a\",\"b\"]").unwrap();
        assert_eq!(
            db.read_state(KEY_VOTES).unwrap().as_deref(),
            Some("[\"a\",\"b\"]")
        );

        assert!(db.clear_state(KEY_VOTES).unwrap());
        assert!(!db.clear_state(KEY_VOTES).unwrap());
        assert_eq!(db.read_state(KEY_VOTES).unwrap(), None);
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let db = Database::open_at(&path).unwrap();
            db.write_state(KEY_PROFILE, "{\"id\":\"u1\"}").unwrap();
        }

        let db = Database::open_at(&path).unwrap();
        assert_eq!(
            db.read_state(KEY_PROFILE).unwrap().as_deref(),
            Some("{\"id\":\"u1\"}")
        );
    }
}
