//! Persistence for the current user [`Profile`].
//!
//! The profile is stored in both persistence modes: in local mode it is the
//! authoritative record, in backend mode it doubles as the session-restore
//! cache.

use podium_shared::Profile;

use crate::database::{Database, KEY_PROFILE};
use crate::error::Result;

impl Database {
    /// Persist the current user profile, replacing any previous one.
    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        let json = serde_json::to_string(profile)?;
        self.write_state(KEY_PROFILE, &json)
    }

    /// Load the persisted profile, if any.
    pub fn load_profile(&self) -> Result<Option<Profile>> {
        match self.read_state(KEY_PROFILE)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Remove the persisted profile (sign-out).  Returns `true` if one was
    /// stored.
    pub fn clear_profile(&self) -> Result<bool> {
        self.clear_state(KEY_PROFILE)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use podium_shared::Profile;

    use crate::Database;

    #[test]
    fn profile_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();

        assert!(db.load_profile().unwrap().is_none());

        let profile = Profile {
            id: "u1".into(),
            email: "ada@example.com".into(),
            name: "Ada".into(),
            bio: None,
            location: Some("London".into()),
            avatar_url: None,
            created_at: Utc::now(),
        };

        db.save_profile(&profile).unwrap();
        assert_eq!(db.load_profile().unwrap(), Some(profile));

        assert!(db.clear_profile().unwrap());
        assert!(db.load_profile().unwrap().is_none());
    }
}
