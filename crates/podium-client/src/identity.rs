//! The identity facade: registration, sign-in and profile maintenance.
//!
//! In backend mode the facade drives the remote auth service and keeps the
//! local store as a session-restore cache; without a backend it manages a
//! purely local profile.  The current profile is broadcast on a watch
//! channel so UI layers react to changes instead of polling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use podium_remote::{Remote, AVATAR_BUCKET, AVATAR_FOLDER};
use podium_shared::{validation, NewProfile, Profile, ProfileUpdate};
use podium_store::Database;

use crate::error::{ClientError, Result};
use crate::uploads::data_url;

/// Client-side identity state and operations.
///
/// Cloning is cheap; clones share all state.
#[derive(Clone)]
pub struct Identity {
    inner: Arc<IdentityInner>,
}

struct IdentityInner {
    /// Backend handle, `None` in local mode.
    remote: Option<Remote>,
    /// Local store, shared with the content facade.
    store: Arc<Mutex<Database>>,
    /// Current profile; the channel doubles as state and broadcast.
    profile: watch::Sender<Option<Profile>>,
    /// True until the initial session restore completes.
    loading: AtomicBool,
    /// True while an auth operation is in flight.
    busy: AtomicBool,
}

impl Identity {
    /// Build the facade over `remote` (`None` for local mode) and the local
    /// store.  Call [`Identity::restore_session`] before first use.
    pub fn new(remote: Option<Remote>, store: Arc<Mutex<Database>>) -> Self {
        let (profile, _) = watch::channel(None);

        Self {
            inner: Arc::new(IdentityInner {
                remote,
                store,
                profile,
                loading: AtomicBool::new(true),
                busy: AtomicBool::new(false),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Exposed state
    // ------------------------------------------------------------------

    /// Snapshot of the current profile.
    pub fn current_profile(&self) -> Option<Profile> {
        self.inner.profile.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.profile.borrow().is_some()
    }

    /// Whether the identity is backed by a live backend session, as opposed
    /// to a local-only profile.
    pub fn is_remote_backed(&self) -> bool {
        self.inner
            .remote
            .as_ref()
            .is_some_and(|r| r.is_authenticated())
    }

    /// True until the initial session restore completes.
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::Relaxed)
    }

    /// True while an auth operation is in flight.
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Relaxed)
    }

    /// Subscribe to profile changes.  The receiver observes the current
    /// value immediately and every replacement after it, including the
    /// deferred population that follows [`Identity::login`].
    pub fn subscribe(&self) -> watch::Receiver<Option<Profile>> {
        self.inner.profile.subscribe()
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Restore any persisted profile, refreshing it from the backend when
    /// one is configured.  Runs once at startup.
    pub async fn restore_session(&self) {
        let saved = match self.store().load_profile() {
            Ok(saved) => saved,
            Err(e) => {
                warn!(error = %e, "could not read persisted profile, starting signed out");
                None
            }
        };

        if let Some(saved) = saved {
            let restored = match &self.inner.remote {
                Some(remote) => self.sync_remote_profile(remote, saved).await,
                None => saved,
            };
            debug!(user_id = %restored.id, "session restored");
            self.set_current(Some(restored));
        }

        self.inner.loading.store(false, Ordering::Relaxed);
    }

    /// Register a new account and make it the current profile.
    ///
    /// Backend mode provisions an auth user plus a profile row; local mode
    /// synthesizes the profile outright.  The password only ever leaves the
    /// process in backend mode.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        details: NewProfile,
    ) -> Result<Profile> {
        validation::check_password(password)?;
        let _busy = BusyGuard::hold(&self.inner.busy);

        let profile = match &self.inner.remote {
            Some(remote) => {
                let (user, session) = remote.sign_up(email, password, &details).await?;
                let profile = remote
                    .create_profile(&user.id, user.email.as_deref().unwrap_or(email), &details)
                    .await?;
                info!(
                    user_id = %profile.id,
                    confirmed = session.is_some(),
                    "registered backend account"
                );
                profile
            }
            None => {
                let profile = Profile {
                    id: Uuid::new_v4().to_string(),
                    email: email.to_string(),
                    name: details.name,
                    bio: details.bio,
                    location: details.location,
                    avatar_url: details.avatar_url,
                    created_at: Utc::now(),
                };
                info!(user_id = %profile.id, "registered local profile");
                profile
            }
        };

        self.persist_profile(&profile);
        self.set_current(Some(profile.clone()));
        Ok(profile)
    }

    /// Sign in against the backend.
    ///
    /// Returns a provisional profile assembled from the auth response; the
    /// full profile row is fetched in the background and replaces it via
    /// the watch channel once it lands.  Callers should subscribe rather
    /// than trust the returned fields beyond `id`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile> {
        let Some(remote) = &self.inner.remote else {
            return Err(ClientError::AuthRequiresBackend);
        };
        let _busy = BusyGuard::hold(&self.inner.busy);

        let session = remote.sign_in(email, password).await?;

        let provisional = Profile {
            id: session.user.id.clone(),
            email: session
                .user
                .email
                .clone()
                .unwrap_or_else(|| email.to_string()),
            name: String::new(),
            bio: None,
            location: None,
            avatar_url: None,
            created_at: Utc::now(),
        };
        self.set_current(Some(provisional.clone()));

        // hydrate the real profile row off the critical path
        let this = self.clone();
        let remote = remote.clone();
        let user_id = provisional.id.clone();
        tokio::spawn(async move {
            this.populate_profile(&remote, &user_id).await;
        });

        info!(user_id = %provisional.id, "signed in");
        Ok(provisional)
    }

    /// Sign out.  Never fails: a failed server-side revocation is logged
    /// and local state is cleared regardless.
    pub async fn logout(&self) {
        let _busy = BusyGuard::hold(&self.inner.busy);

        if let Some(remote) = self.remote_session() {
            if let Err(e) = remote.sign_out().await {
                warn!(error = %e, "server-side sign-out failed, clearing local session anyway");
            }
        }

        if let Err(e) = self.store().clear_profile() {
            warn!(error = %e, "could not clear persisted profile");
        }
        self.set_current(None);
        info!("signed out");
    }

    /// Apply a partial update to the current profile and return the result.
    ///
    /// With a live backend session the row is patched remotely and the
    /// backend's copy wins; a missing row is created on the fly.  Otherwise
    /// the merge is purely local.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Profile> {
        let current = self
            .current_profile()
            .ok_or(ClientError::NotAuthenticated)?;
        let _busy = BusyGuard::hold(&self.inner.busy);

        let merged = current.merged(&update);

        let profile = match self.remote_session() {
            Some(remote) => match remote.update_profile(&current.id, &update).await? {
                Some(profile) => profile,
                None => {
                    debug!(user_id = %current.id, "profile row missing, creating it");
                    let details = NewProfile {
                        name: merged.name.clone(),
                        bio: merged.bio.clone(),
                        location: merged.location.clone(),
                        avatar_url: merged.avatar_url.clone(),
                    };
                    remote
                        .create_profile(&current.id, &merged.email, &details)
                        .await?
                }
            },
            None => merged,
        };

        self.persist_profile(&profile);
        self.set_current(Some(profile.clone()));
        info!(user_id = %profile.id, "profile updated");
        Ok(profile)
    }

    /// Ask the backend to email a password recovery link.
    pub async fn send_password_reset(&self, email: &str) -> Result<()> {
        let Some(remote) = &self.inner.remote else {
            return Err(ClientError::AuthRequiresBackend);
        };

        remote.send_password_reset(email).await?;
        info!("password reset email requested");
        Ok(())
    }

    /// Upload an avatar image and return its URL.  The profile itself is
    /// not touched; pass the URL to [`Identity::update_profile`] to adopt
    /// it.
    ///
    /// Images only, at most [`validation::MAX_AVATAR_BYTES`].
    pub async fn upload_avatar(
        &self,
        file_name: &str,
        mime_type: &str,
        content: Bytes,
    ) -> Result<String> {
        validation::check_avatar_upload(mime_type, content.len() as u64)?;

        match &self.inner.remote {
            Some(remote) => {
                if !remote.is_authenticated() {
                    return Err(ClientError::NotAuthenticated);
                }
                let stored = remote
                    .upload_object(AVATAR_BUCKET, AVATAR_FOLDER, file_name, mime_type, content)
                    .await?;
                Ok(stored.public_url)
            }
            None => Ok(data_url(mime_type, &content)),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Replace the cached profile with the backend's row.  A missing row or
    /// failed fetch keeps the cached copy.
    async fn sync_remote_profile(&self, remote: &Remote, saved: Profile) -> Profile {
        match remote.fetch_profile(&saved.id).await {
            Ok(Some(fresh)) => {
                self.persist_profile(&fresh);
                fresh
            }
            Ok(None) => {
                debug!(user_id = %saved.id, "no remote profile row, keeping cached copy");
                saved
            }
            Err(e) => {
                warn!(error = %e, "profile refresh failed, keeping cached copy");
                saved
            }
        }
    }

    /// Fetch the profile row after sign-in and broadcast it.
    async fn populate_profile(&self, remote: &Remote, user_id: &str) {
        match remote.fetch_profile(user_id).await {
            Ok(Some(profile)) => {
                // a sign-out may have raced the fetch
                if self.current_profile().map(|p| p.id) != Some(profile.id.clone()) {
                    debug!(user_id, "session changed during hydration, dropping result");
                    return;
                }
                self.persist_profile(&profile);
                self.set_current(Some(profile));
                debug!(user_id, "profile hydrated");
            }
            Ok(None) => warn!(user_id, "signed-in user has no profile row"),
            Err(e) => warn!(error = %e, "profile hydration failed"),
        }
    }

    /// The remote handle, when configured and signed in server-side.
    fn remote_session(&self) -> Option<&Remote> {
        self.inner
            .remote
            .as_ref()
            .filter(|r| r.is_authenticated())
    }

    fn set_current(&self, profile: Option<Profile>) {
        self.inner.profile.send_replace(profile);
    }

    /// Memory is the source of truth; a failed cache write is logged, not
    /// surfaced.
    fn persist_profile(&self, profile: &Profile) {
        if let Err(e) = self.store().save_profile(profile) {
            warn!(error = %e, "could not persist profile");
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

/// RAII flag behind [`Identity::is_busy`].
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn hold(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Relaxed);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Relaxed);
    }
}
