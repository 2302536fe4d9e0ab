//! Record store endpoints and wire-format normalisation.
//!
//! The backend's column names (`file_type`, `file_size`, `file_url`, ...)
//! and nested join shapes are translated into the canonical models here, at
//! the gateway boundary.  Empty strings in nullable text columns normalise
//! to `None`.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use podium_shared::{
    Category, Competition, CompetitionEntry, CompetitionStatus, MediaFile, NewCompetition,
    NewProfile, Profile, ProfileUpdate,
};

use crate::api::{expect_success, read_rows, Remote};
use crate::error::{RemoteError, Result};

const PROFILES_TABLE: &str = "profiles";
const COMPETITIONS_TABLE: &str = "competitions";
const MEDIA_TABLE: &str = "media_files";
const VOTES_TABLE: &str = "votes";

/// Server-side function performing the atomic vote-count increment.
const INCREMENT_VOTES_FN: &str = "increment_entry_votes";

/// Nested select pulling competitions with their entries and the joined
/// submitter name and file fields.
const COMPETITIONS_SELECT: &str =
    "*,competition_entries(*,profiles(name),media_files(name,file_url,file_type))";

/// Ask the record store to echo affected rows back.
const PREFER_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProfileRecord> for Profile {
    fn from(r: ProfileRecord) -> Self {
        Profile {
            id: r.id,
            email: r.email.unwrap_or_default(),
            name: r.name.unwrap_or_default(),
            bio: none_if_empty(r.bio),
            location: none_if_empty(r.location),
            avatar_url: none_if_empty(r.avatar_url),
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MediaFileRecord {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MediaFileRecord> for MediaFile {
    fn from(r: MediaFileRecord) -> Self {
        MediaFile {
            id: r.id,
            user_id: r.user_id,
            name: r.name.unwrap_or_default(),
            mime_type: r.file_type.unwrap_or_default(),
            size: r.file_size.unwrap_or(0),
            url: r.file_url.unwrap_or_default(),
            storage_path: none_if_empty(r.file_path),
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompetitionRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rules: Option<String>,
    #[serde(default)]
    pub prize: Option<String>,
    pub created_by: String,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub status: CompetitionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, rename = "competition_entries")]
    pub entries: Vec<EntryRecord>,
}

impl From<CompetitionRecord> for Competition {
    fn from(r: CompetitionRecord) -> Self {
        let mut entries: Vec<CompetitionEntry> = r.entries.into_iter().map(Into::into).collect();
        // nested rows arrive in arbitrary order; canonical order is oldest first
        entries.sort_by_key(|e| e.submitted_at);

        Competition {
            id: r.id,
            title: r.title,
            description: r.description.unwrap_or_default(),
            category: r.category,
            end_date: r.end_date,
            rules: r.rules.unwrap_or_default(),
            prize: r.prize.unwrap_or_default(),
            created_by: r.created_by,
            creator_name: r.creator_name.unwrap_or_default(),
            status: r.status,
            created_at: r.created_at,
            entries,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EntryRecord {
    pub id: String,
    pub user_id: String,
    pub media_file_id: String,
    #[serde(default)]
    pub votes: u32,
    pub created_at: DateTime<Utc>,
    /// Joined submitter profile (display name only).
    #[serde(default, rename = "profiles")]
    pub profile: Option<EntryProfile>,
    /// Joined media file fields.
    #[serde(default, rename = "media_files")]
    pub media_file: Option<EntryMediaFile>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntryProfile {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntryMediaFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
}

impl From<EntryRecord> for CompetitionEntry {
    fn from(r: EntryRecord) -> Self {
        let media = r.media_file.unwrap_or_default();

        CompetitionEntry {
            id: r.id,
            user_id: r.user_id,
            user_name: r.profile.and_then(|p| p.name).unwrap_or_default(),
            file_id: r.media_file_id,
            file_name: media.name.unwrap_or_default(),
            file_url: media.file_url.unwrap_or_default(),
            file_type: media.file_type.unwrap_or_default(),
            submitted_at: r.created_at,
            votes: r.votes,
        }
    }
}

// insert bodies -------------------------------------------------------------

#[derive(Serialize)]
struct NewProfileRecord<'a> {
    id: &'a str,
    email: &'a str,
    name: &'a str,
    bio: &'a str,
    location: &'a str,
    avatar_url: Option<&'a str>,
}

#[derive(Serialize)]
struct ProfilePatch<'a> {
    #[serde(flatten)]
    update: &'a ProfileUpdate,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct NewCompetitionRecord<'a> {
    title: &'a str,
    description: &'a str,
    category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<DateTime<Utc>>,
    rules: &'a str,
    prize: &'a str,
    created_by: &'a str,
    creator_name: &'a str,
    status: CompetitionStatus,
}

#[derive(Serialize)]
struct NewMediaFileRecord<'a> {
    user_id: &'a str,
    name: &'a str,
    file_type: &'a str,
    file_size: u64,
    file_url: &'a str,
    file_path: Option<&'a str>,
}

#[derive(Serialize)]
struct NewVoteRecord<'a> {
    competition_id: &'a str,
    entry_id: &'a str,
    user_id: &'a str,
}

fn none_if_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

impl Remote {
    /// Insert the profile row provisioned at sign-up.
    pub async fn create_profile(
        &self,
        user_id: &str,
        email: &str,
        details: &NewProfile,
    ) -> Result<Profile> {
        let body = NewProfileRecord {
            id: user_id,
            email,
            name: &details.name,
            bio: details.bio.as_deref().unwrap_or(""),
            location: details.location.as_deref().unwrap_or(""),
            avatar_url: details.avatar_url.as_deref(),
        };

        let resp = self
            .authed(self.http().post(self.config().table_url(PROFILES_TABLE)))
            .header(PREFER_REPRESENTATION.0, PREFER_REPRESENTATION.1)
            .json(&body)
            .send()
            .await?;

        let rows: Vec<ProfileRecord> = read_rows(resp).await?;
        rows.into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| RemoteError::Api("profile insert returned no rows".to_string()))
    }

    /// Fetch a profile row by user id.
    pub async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let resp = self
            .authed(self.http().get(self.config().table_url(PROFILES_TABLE)))
            .query(&[("id", format!("eq.{user_id}")), ("select", "*".into())])
            .send()
            .await?;

        let rows: Vec<ProfileRecord> = read_rows(resp).await?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    /// Patch a profile row.  Returns `None` when no row matched, so the
    /// caller can create the missing row and retry.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Profile>> {
        let body = ProfilePatch {
            update,
            updated_at: Utc::now(),
        };

        let resp = self
            .authed(self.http().patch(self.config().table_url(PROFILES_TABLE)))
            .query(&[("id", format!("eq.{user_id}"))])
            .header(PREFER_REPRESENTATION.0, PREFER_REPRESENTATION.1)
            .json(&body)
            .send()
            .await?;

        let rows: Vec<ProfileRecord> = read_rows(resp).await?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    /// Fetch all competitions with entries, newest competition first.
    pub async fn fetch_competitions(&self) -> Result<Vec<Competition>> {
        let resp = self
            .authed(
                self.http()
                    .get(self.config().table_url(COMPETITIONS_TABLE)),
            )
            .query(&[("select", COMPETITIONS_SELECT), ("order", "created_at.desc")])
            .send()
            .await?;

        let rows: Vec<CompetitionRecord> = read_rows(resp).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a competition attributed to the signed-in user.  Id, timestamp
    /// and status come back from the backend.
    pub async fn create_competition(
        &self,
        new: &NewCompetition,
        creator_name: &str,
    ) -> Result<Competition> {
        let user = self.require_user()?;
        let body = NewCompetitionRecord {
            title: &new.title,
            description: &new.description,
            category: new.category,
            end_date: new.end_date,
            rules: &new.rules,
            prize: &new.prize,
            created_by: &user.id,
            creator_name,
            status: CompetitionStatus::Active,
        };

        let resp = self
            .authed(
                self.http()
                    .post(self.config().table_url(COMPETITIONS_TABLE)),
            )
            .header(PREFER_REPRESENTATION.0, PREFER_REPRESENTATION.1)
            .json(&body)
            .send()
            .await?;

        let rows: Vec<CompetitionRecord> = read_rows(resp).await?;
        rows.into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| RemoteError::Api("competition insert returned no rows".to_string()))
    }

    /// Register an uploaded file's metadata, attributed to the signed-in
    /// user.
    pub async fn create_media_file(&self, file: &MediaFile) -> Result<MediaFile> {
        let user = self.require_user()?;
        let body = NewMediaFileRecord {
            user_id: &user.id,
            name: &file.name,
            file_type: &file.mime_type,
            file_size: file.size,
            file_url: &file.url,
            file_path: file.storage_path.as_deref(),
        };

        let resp = self
            .authed(self.http().post(self.config().table_url(MEDIA_TABLE)))
            .header(PREFER_REPRESENTATION.0, PREFER_REPRESENTATION.1)
            .json(&body)
            .send()
            .await?;

        let rows: Vec<MediaFileRecord> = read_rows(resp).await?;
        rows.into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| RemoteError::Api("media insert returned no rows".to_string()))
    }

    /// Fetch the media files owned by `user_id`, newest first.
    pub async fn fetch_user_media_files(&self, user_id: &str) -> Result<Vec<MediaFile>> {
        let resp = self
            .authed(self.http().get(self.config().table_url(MEDIA_TABLE)))
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("select", "*".into()),
                ("order", "created_at.desc".into()),
            ])
            .send()
            .await?;

        let rows: Vec<MediaFileRecord> = read_rows(resp).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Whether a vote by `user_id` exists for this (competition, entry).
    pub async fn vote_exists(
        &self,
        competition_id: &str,
        entry_id: &str,
        user_id: &str,
    ) -> Result<bool> {
        let resp = self
            .authed(self.http().get(self.config().table_url(VOTES_TABLE)))
            .query(&[
                ("competition_id", format!("eq.{competition_id}")),
                ("entry_id", format!("eq.{entry_id}")),
                ("user_id", format!("eq.{user_id}")),
                ("select", "id".into()),
            ])
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = read_rows(resp).await?;
        Ok(!rows.is_empty())
    }

    /// Record a vote by the signed-in user.  Returns `false` without writing
    /// when the user already voted for this entry, `true` after the vote row
    /// is inserted and the entry's count incremented server-side.
    pub async fn add_vote(&self, competition_id: &str, entry_id: &str) -> Result<bool> {
        let user = self.require_user()?;

        if self.vote_exists(competition_id, entry_id, &user.id).await? {
            return Ok(false);
        }

        let body = NewVoteRecord {
            competition_id,
            entry_id,
            user_id: &user.id,
        };

        let resp = self
            .authed(self.http().post(self.config().table_url(VOTES_TABLE)))
            .json(&body)
            .send()
            .await?;

        // a unique-constraint race between check and insert also means
        // "already voted"
        if resp.status() == StatusCode::CONFLICT {
            return Ok(false);
        }
        expect_success(resp).await?;

        self.increment_entry_votes(entry_id).await?;

        debug!(competition_id, entry_id, "vote recorded");
        Ok(true)
    }

    /// Atomically bump an entry's vote count via the server-side function.
    pub async fn increment_entry_votes(&self, entry_id: &str) -> Result<()> {
        let resp = self
            .authed(self.http().post(self.config().rpc_url(INCREMENT_VOTES_FN)))
            .json(&serde_json::json!({ "entry_id": entry_id }))
            .send()
            .await?;

        expect_success(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_record_normalises_empty_optionals() {
        let json = r#"{
            "id": "u1",
            "email": "ada@example.com",
            "name": "Ada",
            "bio": "",
            "location": "London",
            "avatar_url": null,
            "created_at": "2024-03-01T12:00:00+00:00"
        }"#;

        let record: ProfileRecord = serde_json::from_str(json).unwrap();
        let profile = Profile::from(record);

        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.bio, None);
        assert_eq!(profile.location.as_deref(), Some("London"));
        assert_eq!(profile.avatar_url, None);
    }

    #[test]
    fn media_record_maps_wire_column_names() {
        let json = r#"{
            "id": "f1",
            "user_id": "u1",
            "name": "clip.mp4",
            "file_type": "video/mp4",
            "file_size": 1048576,
            "file_url": "https://cdn.example.com/clip.mp4",
            "file_path": "u1/uploads/clip.mp4",
            "created_at": "2024-03-01T12:00:00Z"
        }"#;

        let record: MediaFileRecord = serde_json::from_str(json).unwrap();
        let file = MediaFile::from(record);

        assert_eq!(file.mime_type, "video/mp4");
        assert_eq!(file.size, 1_048_576);
        assert_eq!(file.url, "https://cdn.example.com/clip.mp4");
        assert_eq!(file.storage_path.as_deref(), Some("u1/uploads/clip.mp4"));
    }

    #[test]
    fn competition_record_flattens_nested_joins() {
        let json = r#"{
            "id": "c1",
            "title": "Best sunset",
            "description": null,
            "category": "photo",
            "end_date": null,
            "rules": "one entry per person",
            "prize": null,
            "created_by": "u1",
            "creator_name": "Ada",
            "status": "active",
            "created_at": "2024-03-01T12:00:00Z",
            "competition_entries": [
                {
                    "id": "e2",
                    "user_id": "u3",
                    "media_file_id": "f3",
                    "votes": 4,
                    "created_at": "2024-03-02T09:00:00Z",
                    "profiles": { "name": "Grace" },
                    "media_files": {
                        "name": "dusk.jpg",
                        "file_url": "https://cdn.example.com/dusk.jpg",
                        "file_type": "image/jpeg"
                    }
                },
                {
                    "id": "e1",
                    "user_id": "u2",
                    "media_file_id": "f2",
                    "votes": 1,
                    "created_at": "2024-03-01T15:00:00Z",
                    "profiles": null,
                    "media_files": null
                }
            ]
        }"#;

        let record: CompetitionRecord = serde_json::from_str(json).unwrap();
        let competition = Competition::from(record);

        assert_eq!(competition.description, "");
        assert_eq!(competition.prize, "");

        // entries re-sorted oldest first
        assert_eq!(competition.entries.len(), 2);
        assert_eq!(competition.entries[0].id, "e1");
        assert_eq!(competition.entries[1].id, "e2");

        // joined fields flattened onto the entry
        let e2 = &competition.entries[1];
        assert_eq!(e2.user_name, "Grace");
        assert_eq!(e2.file_id, "f3");
        assert_eq!(e2.file_name, "dusk.jpg");
        assert_eq!(e2.file_type, "image/jpeg");

        // missing joins degrade to empty strings
        let e1 = &competition.entries[0];
        assert_eq!(e1.user_name, "");
        assert_eq!(e1.file_url, "");
    }

    #[test]
    fn profile_patch_serialises_only_provided_fields() {
        let update = ProfileUpdate {
            name: Some("Ada L.".into()),
            ..Default::default()
        };
        let patch = ProfilePatch {
            update: &update,
            updated_at: "2024-03-01T12:00:00Z".parse().unwrap(),
        };

        let value = serde_json::to_value(&patch).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), 2);
        assert_eq!(obj["name"], "Ada L.");
        assert!(obj.contains_key("updated_at"));
        assert!(!obj.contains_key("bio"));
    }
}
