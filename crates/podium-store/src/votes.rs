//! Persistence for recorded vote keys.
//!
//! Votes are stored as the composite strings produced by
//! [`podium_shared::vote_key`]; the collection is only ever searched for
//! exact matches.

use crate::database::{Database, KEY_VOTES};
use crate::error::Result;

impl Database {
    /// Persist the full vote key collection, replacing the previous snapshot.
    pub fn save_vote_keys(&self, keys: &[String]) -> Result<()> {
        let json = serde_json::to_string(keys)?;
        self.write_state(KEY_VOTES, &json)
    }

    /// Load the vote key collection.  An absent key yields an empty list.
    pub fn load_vote_keys(&self) -> Result<Vec<String>> {
        match self.read_state(KEY_VOTES)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use podium_shared::vote_key;

    use crate::Database;

    #[test]
    fn vote_keys_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();

        assert!(db.load_vote_keys().unwrap().is_empty());

        let keys = vec![vote_key("c1", "e1", "u1"), vote_key("c1", "e2", "u1")];
        db.save_vote_keys(&keys).unwrap();

        assert_eq!(db.load_vote_keys().unwrap(), keys);
    }
}
