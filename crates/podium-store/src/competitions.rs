//! Persistence for the [`Competition`] collection.
//!
//! The whole collection (entries included) is written as a single JSON
//! document, mirroring the in-memory shape the client works with.

use podium_shared::Competition;

use crate::database::{Database, KEY_COMPETITIONS};
use crate::error::Result;

impl Database {
    /// Persist the full competitions collection, replacing the previous
    /// snapshot.
    pub fn save_competitions(&self, competitions: &[Competition]) -> Result<()> {
        let json = serde_json::to_string(competitions)?;
        self.write_state(KEY_COMPETITIONS, &json)
    }

    /// Load the competitions collection.  An absent key yields an empty list.
    pub fn load_competitions(&self) -> Result<Vec<Competition>> {
        match self.read_state(KEY_COMPETITIONS)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}
