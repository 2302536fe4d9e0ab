//! Domain model structs shared by the store, the remote gateway and the
//! client facades.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be persisted
//! as JSON in the local store and handed directly to a UI layer.  Optional
//! fields carry `#[serde(default)]` so older snapshots and sparse backend
//! rows keep deserializing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Category, CompetitionStatus};

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A user profile, local or backend-provisioned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Unique identifier.  Backend-assigned in backend mode, synthesized
    /// locally otherwise.  Opaque to callers either way.
    pub id: String,
    /// Email address used at registration.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Optional free-form biography.
    #[serde(default)]
    pub bio: Option<String>,
    /// Optional location string.
    #[serde(default)]
    pub location: Option<String>,
    /// Optional avatar URL (public object URL or data URL).
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Shallow-merge an update into this profile: only provided fields
    /// overwrite, everything else is carried over unchanged.
    pub fn merged(&self, update: &ProfileUpdate) -> Profile {
        let mut out = self.clone();
        if let Some(name) = &update.name {
            out.name = name.clone();
        }
        if let Some(email) = &update.email {
            out.email = email.clone();
        }
        if let Some(bio) = &update.bio {
            out.bio = Some(bio.clone());
        }
        if let Some(location) = &update.location {
            out.location = Some(location.clone());
        }
        if let Some(avatar_url) = &update.avatar_url {
            out.avatar_url = Some(avatar_url.clone());
        }
        out
    }
}

/// Descriptive fields supplied at registration time.
///
/// The credential pair (email, password) travels separately.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewProfile {
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Partial profile update.  `None` fields are left untouched by
/// [`Profile::merged`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Competition
// ---------------------------------------------------------------------------

/// A competition plus its embedded entries.
///
/// Entries are kept in submission order; ranked views are computed on
/// demand via [`Competition::entries_by_votes`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Competition {
    /// Unique identifier (backend-assigned or locally synthesized).
    pub id: String,
    /// Title shown in listings.
    pub title: String,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Media category this competition accepts.
    pub category: Category,
    /// Optional end date.  A competition with no end date never
    /// auto-transitions to ended.
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Free-form rules text.
    #[serde(default)]
    pub rules: String,
    /// Free-form prize description.
    #[serde(default)]
    pub prize: String,
    /// Id of the creating user, or `"anonymous"`.
    pub created_by: String,
    /// Display name of the creating user, denormalized for listings.
    #[serde(default)]
    pub creator_name: String,
    /// Stored lifecycle status.  Prefer [`Competition::effective_status`],
    /// which also accounts for a passed end date.
    #[serde(default)]
    pub status: CompetitionStatus,
    /// When the competition was created.
    pub created_at: DateTime<Utc>,
    /// Submitted entries, oldest first.
    #[serde(default)]
    pub entries: Vec<CompetitionEntry>,
}

impl Competition {
    /// Status as of `now`: a passed end date reports
    /// [`CompetitionStatus::Ended`] regardless of the stored status.
    pub fn effective_status(&self, now: DateTime<Utc>) -> CompetitionStatus {
        match self.end_date {
            Some(end) if end < now => CompetitionStatus::Ended,
            _ => self.status,
        }
    }

    /// Entries ranked by vote count, highest first.  The sort is stable, so
    /// ties keep submission order.  The stored order is not touched.
    pub fn entries_by_votes(&self) -> Vec<CompetitionEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
        ranked
    }

    /// Whether `user_id` already submitted an entry to this competition.
    pub fn has_entry_from(&self, user_id: &str) -> bool {
        self.entries.iter().any(|e| e.user_id == user_id)
    }
}

/// Fields a caller supplies when creating a competition.  Identity,
/// timestamps and status are filled in by the content store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCompetition {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rules: String,
    #[serde(default)]
    pub prize: String,
}

// ---------------------------------------------------------------------------
// Competition entry
// ---------------------------------------------------------------------------

/// A media file submitted to a competition.
///
/// File metadata is denormalized onto the entry so listings render without
/// extra lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompetitionEntry {
    /// Unique identifier.
    pub id: String,
    /// Id of the submitting user.
    pub user_id: String,
    /// Display name of the submitting user.
    #[serde(default)]
    pub user_name: String,
    /// Id of the submitted media file.
    pub file_id: String,
    /// Original file name.
    #[serde(default)]
    pub file_name: String,
    /// URL the file is served from (public object URL or data URL).
    #[serde(default)]
    pub file_url: String,
    /// MIME type of the file.
    #[serde(default)]
    pub file_type: String,
    /// When the entry was submitted.
    pub submitted_at: DateTime<Utc>,
    /// Accumulated vote count.
    #[serde(default)]
    pub votes: u32,
}

/// Fields a caller supplies when submitting an entry.  Id, timestamp and the
/// zero vote count are filled in by the content store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewEntry {
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    pub file_id: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_url: String,
    #[serde(default)]
    pub file_type: String,
}

// ---------------------------------------------------------------------------
// Media file
// ---------------------------------------------------------------------------

/// Metadata for an uploaded media file.  The binary itself lives in object
/// storage (backend mode) or inline in `url` as a data URL (local mode).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaFile {
    /// Unique identifier.
    pub id: String,
    /// Id of the owning user.
    pub user_id: String,
    /// Original file name.
    pub name: String,
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// File size in bytes.
    pub size: u64,
    /// URL the file is served from.
    pub url: String,
    /// Object storage path, `None` for data-URL uploads.
    #[serde(default)]
    pub storage_path: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Fields a caller supplies when registering an uploaded file.  Id and
/// timestamp are filled in by the content store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMediaFile {
    pub user_id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub url: String,
    #[serde(default)]
    pub storage_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn profile() -> Profile {
        Profile {
            id: "u1".into(),
            email: "ada@example.com".into(),
            name: "Ada".into(),
            bio: Some("engineer".into()),
            location: None,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    fn competition(end_date: Option<DateTime<Utc>>) -> Competition {
        Competition {
            id: "c1".into(),
            title: "Best sunset".into(),
            description: String::new(),
            category: Category::Photo,
            end_date,
            rules: String::new(),
            prize: String::new(),
            created_by: "u1".into(),
            creator_name: "Ada".into(),
            status: CompetitionStatus::Active,
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    fn entry(id: &str, user: &str, votes: u32) -> CompetitionEntry {
        CompetitionEntry {
            id: id.into(),
            user_id: user.into(),
            user_name: user.to_ascii_uppercase(),
            file_id: format!("f-{id}"),
            file_name: "photo.jpg".into(),
            file_url: "data:image/jpeg;base64,AAAA".into(),
            file_type: "image/jpeg".into(),
            submitted_at: Utc::now(),
            votes,
        }
    }

    #[test]
    fn merged_overwrites_only_provided_fields() {
        let p = profile();
        let update = ProfileUpdate {
            name: Some("Ada L.".into()),
            location: Some("London".into()),
            ..Default::default()
        };

        let merged = p.merged(&update);
        assert_eq!(merged.name, "Ada L.");
        assert_eq!(merged.location.as_deref(), Some("London"));
        // untouched fields survive
        assert_eq!(merged.email, p.email);
        assert_eq!(merged.bio, p.bio);
        assert_eq!(merged.id, p.id);
    }

    #[test]
    fn merged_with_empty_update_is_identity() {
        let p = profile();
        assert_eq!(p.merged(&ProfileUpdate::default()), p);
    }

    #[test]
    fn effective_status_honours_passed_end_date() {
        let now = Utc::now();

        let past = competition(Some(now - Duration::hours(1)));
        assert_eq!(past.effective_status(now), CompetitionStatus::Ended);

        let future = competition(Some(now + Duration::hours(1)));
        assert_eq!(future.effective_status(now), CompetitionStatus::Active);

        // no end date: stored status wins, never auto-transitions
        let open = competition(None);
        assert_eq!(open.effective_status(now), CompetitionStatus::Active);

        let mut closed = competition(None);
        closed.status = CompetitionStatus::Ended;
        assert_eq!(closed.effective_status(now), CompetitionStatus::Ended);
    }

    #[test]
    fn entries_by_votes_ranks_descending_and_keeps_ties_stable() {
        let mut c = competition(None);
        c.entries = vec![
            entry("e1", "u1", 2),
            entry("e2", "u2", 5),
            entry("e3", "u3", 2),
        ];

        let ranked = c.entries_by_votes();
        let ids: Vec<&str> = ranked.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["e2", "e1", "e3"]);

        // stored order untouched
        assert_eq!(c.entries[0].id, "e1");
    }

    #[test]
    fn has_entry_from_matches_user() {
        let mut c = competition(None);
        c.entries = vec![entry("e1", "u1", 0)];

        assert!(c.has_entry_from("u1"));
        assert!(!c.has_entry_from("u2"));
    }

    #[test]
    fn sparse_competition_json_deserializes_with_defaults() {
        let json = r#"{
            "id": "c9",
            "title": "Night shots",
            "category": "photo",
            "created_by": "u1",
            "created_at": "2024-03-01T12:00:00Z"
        }"#;

        let c: Competition = serde_json::from_str(json).unwrap();
        assert_eq!(c.status, CompetitionStatus::Active);
        assert!(c.entries.is_empty());
        assert!(c.end_date.is_none());
        assert_eq!(c.rules, "");
    }
}
