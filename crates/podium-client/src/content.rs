//! The content facade: competitions, entries, media files and votes.
//!
//! Collections live in memory and are owned exclusively by the facade;
//! callers get snapshots and mutate through operations.  Each operation
//! targets the backend when one is configured and falls back to the local
//! store otherwise, following the same dual-mode split as the identity
//! facade.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use podium_remote::{Remote, MEDIA_BUCKET, MEDIA_FOLDER};
use podium_shared::{
    validation, vote_key, Competition, CompetitionEntry, CompetitionStatus, MediaFile,
    NewCompetition, NewEntry, NewMediaFile, Profile,
};
use podium_store::Database;

use crate::error::{ClientError, Result};
use crate::uploads::{data_url, MediaUpload};

/// Creator id recorded when nobody is signed in.
const ANONYMOUS_ID: &str = "anonymous";
/// Creator display name recorded when nobody is signed in.
const ANONYMOUS_NAME: &str = "Anonymous";

/// Client-side content state and operations.
///
/// Cloning is cheap; clones share all state.
#[derive(Clone)]
pub struct ContentStore {
    inner: Arc<ContentInner>,
}

struct ContentInner {
    /// Backend handle, `None` in local mode.
    remote: Option<Remote>,
    /// Local store, shared with the identity facade.
    store: Arc<Mutex<Database>>,
    /// Current profile, fed by [`crate::Identity::subscribe`].
    profile: watch::Receiver<Option<Profile>>,
    competitions: RwLock<Vec<Competition>>,
    media_files: RwLock<Vec<MediaFile>>,
    vote_keys: RwLock<HashSet<String>>,
    /// True until the initial load completes.
    loading: AtomicBool,
}

impl ContentStore {
    /// Build the facade over `remote` (`None` for local mode), the local
    /// store and the identity facade's profile feed.  Call
    /// [`ContentStore::load`] before first use.
    pub fn new(
        remote: Option<Remote>,
        store: Arc<Mutex<Database>>,
        profile: watch::Receiver<Option<Profile>>,
    ) -> Self {
        Self {
            inner: Arc::new(ContentInner {
                remote,
                store,
                profile,
                competitions: RwLock::new(Vec::new()),
                media_files: RwLock::new(Vec::new()),
                vote_keys: RwLock::new(HashSet::new()),
                loading: AtomicBool::new(true),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Populate the collections: from the backend when configured, from the
    /// local store otherwise.  Runs once at startup.
    pub async fn load(&self) {
        match &self.inner.remote {
            Some(remote) => match remote.fetch_competitions().await {
                Ok(fetched) => {
                    debug!(count = fetched.len(), "loaded competitions from backend");
                    *write(&self.inner.competitions) = fetched;
                }
                Err(e) => warn!(error = %e, "could not fetch competitions, starting empty"),
            },
            None => self.load_local(),
        }

        self.inner.loading.store(false, Ordering::Relaxed);
    }

    /// Re-fetch the competition collection from the backend.  No-op in
    /// local mode; a failed fetch keeps the current data.
    pub async fn reload_competitions(&self) {
        let Some(remote) = &self.inner.remote else {
            return;
        };
        match remote.fetch_competitions().await {
            Ok(fetched) => *write(&self.inner.competitions) = fetched,
            Err(e) => warn!(error = %e, "competition reload failed, keeping current data"),
        }
    }

    fn load_local(&self) {
        let (competitions, media_files, votes) = {
            let store = self.store();
            (
                store.load_competitions(),
                store.load_media_files(),
                store.load_vote_keys(),
            )
        };

        // each collection degrades to empty independently
        *write(&self.inner.competitions) = competitions.unwrap_or_else(|e| {
            warn!(error = %e, "could not load persisted competitions");
            Vec::new()
        });
        *write(&self.inner.media_files) = media_files.unwrap_or_else(|e| {
            warn!(error = %e, "could not load persisted media files");
            Vec::new()
        });
        *write(&self.inner.vote_keys) = votes
            .unwrap_or_else(|e| {
                warn!(error = %e, "could not load persisted votes");
                Vec::new()
            })
            .into_iter()
            .collect();
    }

    // ------------------------------------------------------------------
    // Exposed state
    // ------------------------------------------------------------------

    /// Snapshot of all competitions, newest first.
    pub fn competitions(&self) -> Vec<Competition> {
        read(&self.inner.competitions).clone()
    }

    /// Snapshot of a single competition.
    pub fn competition(&self, id: &str) -> Option<Competition> {
        read(&self.inner.competitions)
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// Snapshot of all media files, newest first.
    pub fn media_files(&self) -> Vec<MediaFile> {
        read(&self.inner.media_files).clone()
    }

    /// True until the initial load completes.
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::Relaxed)
    }

    // ------------------------------------------------------------------
    // Competitions
    // ------------------------------------------------------------------

    /// Create a competition and prepend it to the collection.
    ///
    /// With a signed-in backend session the backend assigns id, timestamp
    /// and creator attribution; otherwise those are synthesized here and
    /// the collection is persisted locally.
    pub async fn add_competition(&self, new: NewCompetition) -> Result<Competition> {
        let competition = match self.remote_session() {
            Some(remote) => {
                let creator_name = self
                    .current_user()
                    .map(|p| p.name)
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| ANONYMOUS_NAME.to_string());
                remote.create_competition(&new, &creator_name).await?
            }
            None => {
                let (created_by, creator_name) = self.attribution();
                Competition {
                    id: Uuid::new_v4().to_string(),
                    title: new.title,
                    description: new.description,
                    category: new.category,
                    end_date: new.end_date,
                    rules: new.rules,
                    prize: new.prize,
                    created_by,
                    creator_name,
                    status: CompetitionStatus::Active,
                    created_at: Utc::now(),
                    entries: Vec::new(),
                }
            }
        };

        {
            let mut competitions = write(&self.inner.competitions);
            competitions.insert(0, competition.clone());
            if self.remote_session().is_none() {
                self.persist_competitions(&competitions);
            }
        }

        info!(competition_id = %competition.id, title = %competition.title, "competition created");
        Ok(competition)
    }

    /// Attach an entry to a competition.
    ///
    /// Purely local bookkeeping: entries reach the backend through their
    /// own creation path, not through this facade.  Returns `None` without
    /// any effect when no competition matches.
    pub fn add_entry_to_competition(
        &self,
        competition_id: &str,
        new: NewEntry,
    ) -> Option<CompetitionEntry> {
        let entry = CompetitionEntry {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            user_name: new.user_name,
            file_id: new.file_id,
            file_name: new.file_name,
            file_url: new.file_url,
            file_type: new.file_type,
            submitted_at: Utc::now(),
            votes: 0,
        };

        let mut competitions = write(&self.inner.competitions);
        let Some(competition) = competitions.iter_mut().find(|c| c.id == competition_id) else {
            debug!(competition_id, "entry for unknown competition, ignoring");
            return None;
        };

        competition.entries.push(entry.clone());
        self.persist_competitions(&competitions);

        info!(competition_id, entry_id = %entry.id, "entry added");
        Some(entry)
    }

    // ------------------------------------------------------------------
    // Votes
    // ------------------------------------------------------------------

    /// Record a vote by `user_id` on an entry.  Returns `true` when the
    /// vote was counted and `false` when this user already voted for this
    /// entry; a duplicate never increments.
    ///
    /// With a signed-in backend session the backend is authoritative (the
    /// vote is attributed to the session user) and the competition
    /// collection is reloaded to pick up the server-side count.
    pub async fn add_vote(
        &self,
        competition_id: &str,
        entry_id: &str,
        user_id: &str,
    ) -> Result<bool> {
        match &self.inner.remote {
            Some(remote) => {
                if !remote.is_authenticated() {
                    debug!(competition_id, entry_id, "vote without a session, ignoring");
                    return Ok(false);
                }
                let counted = remote.add_vote(competition_id, entry_id).await?;
                if counted {
                    self.reload_competitions().await;
                }
                Ok(counted)
            }
            None => Ok(self.add_vote_local(competition_id, entry_id, user_id)),
        }
    }

    fn add_vote_local(&self, competition_id: &str, entry_id: &str, user_id: &str) -> bool {
        let key = vote_key(competition_id, entry_id, user_id);

        let mut votes = write(&self.inner.vote_keys);
        if votes.contains(&key) {
            return false;
        }
        votes.insert(key);
        let keys: Vec<String> = votes.iter().cloned().collect();
        self.persist_vote_keys(&keys);

        let mut competitions = write(&self.inner.competitions);
        if let Some(entry) = competitions
            .iter_mut()
            .find(|c| c.id == competition_id)
            .and_then(|c| c.entries.iter_mut().find(|e| e.id == entry_id))
        {
            entry.votes += 1;
            self.persist_competitions(&competitions);
        }

        info!(competition_id, entry_id, "vote recorded");
        true
    }

    /// Whether `user_id` already voted for this entry, checked against
    /// whichever source is authoritative.
    pub async fn has_user_voted(
        &self,
        competition_id: &str,
        entry_id: &str,
        user_id: &str,
    ) -> bool {
        if let Some(remote) = &self.inner.remote {
            match remote.vote_exists(competition_id, entry_id, user_id).await {
                Ok(exists) => return exists,
                Err(e) => warn!(error = %e, "vote lookup failed, falling back to local data"),
            }
        }

        let key = vote_key(competition_id, entry_id, user_id);
        read(&self.inner.vote_keys).contains(&key)
    }

    // ------------------------------------------------------------------
    // Media files
    // ------------------------------------------------------------------

    /// Upload a media file's content and return where it landed.  The
    /// metadata record is a separate step, [`ContentStore::add_media_file`].
    ///
    /// Images, video and audio only, at most
    /// [`validation::MAX_MEDIA_BYTES`].
    pub async fn upload_media(
        &self,
        file_name: &str,
        mime_type: &str,
        content: Bytes,
    ) -> Result<MediaUpload> {
        validation::check_media_upload(mime_type, content.len() as u64)?;

        match &self.inner.remote {
            Some(remote) => {
                if !remote.is_authenticated() {
                    return Err(ClientError::NotAuthenticated);
                }
                let stored = remote
                    .upload_object(MEDIA_BUCKET, MEDIA_FOLDER, file_name, mime_type, content)
                    .await?;
                Ok(MediaUpload {
                    url: stored.public_url,
                    storage_path: Some(stored.path),
                })
            }
            None => Ok(MediaUpload {
                url: data_url(mime_type, &content),
                storage_path: None,
            }),
        }
    }

    /// Register an uploaded file and prepend it to the collection.
    ///
    /// The local record (with a synthesized id) is created and persisted in
    /// every mode so the caller has an immediate reference.  With a
    /// signed-in backend session the metadata is additionally registered
    /// remotely; a remote failure leaves the local record in place but
    /// still surfaces as `Err`.
    pub async fn add_media_file(&self, new: NewMediaFile) -> Result<MediaFile> {
        let file = MediaFile {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            name: new.name,
            mime_type: new.mime_type,
            size: new.size,
            url: new.url,
            storage_path: new.storage_path,
            created_at: Utc::now(),
        };

        {
            let mut files = write(&self.inner.media_files);
            files.insert(0, file.clone());
            self.persist_media_files(&files);
        }

        if let Some(remote) = self.remote_session() {
            remote.create_media_file(&file).await?;
        }

        info!(file_id = %file.id, name = %file.name, "media file registered");
        Ok(file)
    }

    /// The media files owned by `user_id`, newest first in backend mode,
    /// insertion order locally.  Never fails: a failed backend query is
    /// logged and answered from the in-memory collection.
    pub async fn get_user_media_files(&self, user_id: &str) -> Vec<MediaFile> {
        if let Some(remote) = self.remote_session() {
            match remote.fetch_user_media_files(user_id).await {
                Ok(files) => return files,
                Err(e) => warn!(error = %e, "media query failed, falling back to local data"),
            }
        }

        read(&self.inner.media_files)
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// The remote handle, when configured and signed in server-side.
    fn remote_session(&self) -> Option<&Remote> {
        self.inner
            .remote
            .as_ref()
            .filter(|r| r.is_authenticated())
    }

    fn current_user(&self) -> Option<Profile> {
        self.inner.profile.borrow().clone()
    }

    /// Creator fields from the current profile, or the anonymous pair.
    fn attribution(&self) -> (String, String) {
        match self.current_user() {
            Some(p) => (p.id, p.name),
            None => (ANONYMOUS_ID.to_string(), ANONYMOUS_NAME.to_string()),
        }
    }

    /// Memory is the source of truth; failed cache writes are logged, not
    /// surfaced.
    fn persist_competitions(&self, competitions: &[Competition]) {
        if let Err(e) = self.store().save_competitions(competitions) {
            warn!(error = %e, "could not persist competitions");
        }
    }

    fn persist_media_files(&self, files: &[MediaFile]) {
        if let Err(e) = self.store().save_media_files(files) {
            warn!(error = %e, "could not persist media files");
        }
    }

    fn persist_vote_keys(&self, keys: &[String]) {
        if let Err(e) = self.store().save_vote_keys(keys) {
            warn!(error = %e, "could not persist votes");
        }
    }

    fn store(&self) -> MutexGuard<'_, Database> {
        // a poisoned lock still holds a usable connection
        self.inner
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use podium_shared::{Category, ValidationError};

    fn local_content(dir: &tempfile::TempDir, profile: Option<Profile>) -> ContentStore {
        let db = Database::open_at(&dir.path().join("content.db")).unwrap();
        let (_tx, rx) = watch::channel(profile);
        ContentStore::new(None, Arc::new(Mutex::new(db)), rx)
    }

    fn profile(id: &str, name: &str) -> Profile {
        Profile {
            id: id.into(),
            email: format!("{id}@example.com"),
            name: name.into(),
            bio: None,
            location: None,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    fn new_competition(title: &str) -> NewCompetition {
        NewCompetition {
            title: title.into(),
            description: "a contest".into(),
            category: Category::Photo,
            end_date: None,
            rules: String::new(),
            prize: String::new(),
        }
    }

    fn new_entry(user_id: &str, file_id: &str) -> NewEntry {
        NewEntry {
            user_id: user_id.into(),
            user_name: user_id.to_ascii_uppercase(),
            file_id: file_id.into(),
            file_name: "sunset.jpg".into(),
            file_url: "data:image/jpeg;base64,AAAA".into(),
            file_type: "image/jpeg".into(),
        }
    }

    fn new_media_file(user_id: &str, name: &str) -> NewMediaFile {
        NewMediaFile {
            user_id: user_id.into(),
            name: name.into(),
            mime_type: "image/jpeg".into(),
            size: 1024,
            url: format!("data:image/jpeg;base64,{name}"),
            storage_path: None,
        }
    }

    #[tokio::test]
    async fn competitions_prepend_and_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let content = local_content(&dir, Some(profile("u1", "Ada")));
        content.load().await;
        assert!(!content.is_loading());

        let first = content.add_competition(new_competition("First")).await.unwrap();
        let second = content.add_competition(new_competition("Second")).await.unwrap();

        let listed = content.competitions();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert_eq!(listed[0].created_by, "u1");
        assert_eq!(listed[0].creator_name, "Ada");
        assert_eq!(listed[0].status, CompetitionStatus::Active);

        // a fresh facade over the same store reproduces the collection
        let reloaded = local_content(&dir, None);
        reloaded.load().await;
        let listed = reloaded.competitions();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[0].title, "Second");
        assert_eq!(listed[0].category, Category::Photo);
        assert!(listed[0].entries.is_empty());
    }

    #[tokio::test]
    async fn anonymous_creation_is_attributed() {
        let dir = tempfile::tempdir().unwrap();
        let content = local_content(&dir, None);
        content.load().await;

        let competition = content.add_competition(new_competition("Open")).await.unwrap();

        assert_eq!(competition.created_by, "anonymous");
        assert_eq!(competition.creator_name, "Anonymous");
    }

    #[tokio::test]
    async fn entries_append_in_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        let content = local_content(&dir, Some(profile("u1", "Ada")));
        content.load().await;

        let competition = content.add_competition(new_competition("Sunsets")).await.unwrap();

        let e1 = content
            .add_entry_to_competition(&competition.id, new_entry("u2", "f1"))
            .unwrap();
        let e2 = content
            .add_entry_to_competition(&competition.id, new_entry("u3", "f2"))
            .unwrap();
        assert_eq!(e1.votes, 0);

        let stored = content.competition(&competition.id).unwrap();
        assert_eq!(stored.entries.len(), 2);
        assert_eq!(stored.entries[0].id, e1.id);
        assert_eq!(stored.entries[1].id, e2.id);

        // entries are persisted with the competition
        let reloaded = local_content(&dir, None);
        reloaded.load().await;
        let stored = reloaded.competition(&competition.id).unwrap();
        assert_eq!(stored.entries.len(), 2);
        assert_eq!(stored.entries[0].user_name, "U2");
    }

    #[tokio::test]
    async fn entry_for_unknown_competition_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let content = local_content(&dir, None);
        content.load().await;

        assert!(content
            .add_entry_to_competition("no-such-id", new_entry("u2", "f1"))
            .is_none());
        assert!(content.competitions().is_empty());

        let reloaded = local_content(&dir, None);
        reloaded.load().await;
        assert!(reloaded.competitions().is_empty());
    }

    #[tokio::test]
    async fn votes_count_exactly_once_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let content = local_content(&dir, Some(profile("u1", "Ada")));
        content.load().await;

        let competition = content.add_competition(new_competition("Sunsets")).await.unwrap();
        let entry = content
            .add_entry_to_competition(&competition.id, new_entry("u2", "f1"))
            .unwrap();

        assert!(content.add_vote(&competition.id, &entry.id, "u1").await.unwrap());
        assert!(!content.add_vote(&competition.id, &entry.id, "u1").await.unwrap());

        let stored = content.competition(&competition.id).unwrap();
        assert_eq!(stored.entries[0].votes, 1);
        assert!(content.has_user_voted(&competition.id, &entry.id, "u1").await);
        assert!(!content.has_user_voted(&competition.id, &entry.id, "u3").await);

        // a different user still gets a vote
        assert!(content.add_vote(&competition.id, &entry.id, "u3").await.unwrap());
        assert_eq!(content.competition(&competition.id).unwrap().entries[0].votes, 2);

        // votes and counts survive a reload
        let reloaded = local_content(&dir, None);
        reloaded.load().await;
        assert_eq!(reloaded.competition(&competition.id).unwrap().entries[0].votes, 2);
        assert!(reloaded.has_user_voted(&competition.id, &entry.id, "u1").await);
    }

    #[tokio::test]
    async fn vote_for_unknown_entry_records_key_only() {
        let dir = tempfile::tempdir().unwrap();
        let content = local_content(&dir, Some(profile("u1", "Ada")));
        content.load().await;

        let competition = content.add_competition(new_competition("Sunsets")).await.unwrap();

        assert!(content.add_vote(&competition.id, "ghost", "u1").await.unwrap());
        assert!(content.competition(&competition.id).unwrap().entries.is_empty());
        assert!(!content.add_vote(&competition.id, "ghost", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn media_files_prepend_persist_and_filter_by_owner() {
        let dir = tempfile::tempdir().unwrap();
        let content = local_content(&dir, Some(profile("u1", "Ada")));
        content.load().await;

        content.add_media_file(new_media_file("u1", "a.jpg")).await.unwrap();
        content.add_media_file(new_media_file("u2", "b.jpg")).await.unwrap();
        content.add_media_file(new_media_file("u1", "c.jpg")).await.unwrap();

        let all = content.media_files();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "c.jpg");

        let owned = content.get_user_media_files("u1").await;
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].name, "c.jpg");
        assert_eq!(owned[1].name, "a.jpg");

        // the collection is an offline cache, persisted unconditionally
        let reloaded = local_content(&dir, None);
        reloaded.load().await;
        assert_eq!(reloaded.media_files().len(), 3);
        assert_eq!(reloaded.get_user_media_files("u2").await.len(), 1);
    }

    #[tokio::test]
    async fn local_media_upload_embeds_a_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let content = local_content(&dir, Some(profile("u1", "Ada")));
        content.load().await;

        let upload = content
            .upload_media("clip.mp4", "video/mp4", Bytes::from_static(b"mp4-bytes"))
            .await
            .unwrap();
        assert!(upload.url.starts_with("data:video/mp4;base64,"));
        assert_eq!(upload.storage_path, None);

        let err = content
            .upload_media("notes.txt", "text/plain", Bytes::from_static(b"hi"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::UnsupportedMediaType { .. })
        ));
    }
}
