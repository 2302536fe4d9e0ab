//! The [`Remote`] handle and shared request plumbing.
//!
//! Endpoint groups live in sibling modules (`auth`, `records`, `storage`),
//! each extending `impl Remote`.

use std::sync::{Arc, Mutex, PoisonError};

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::auth::{AuthUser, Session};
use crate::config::RemoteConfig;
use crate::error::{RemoteError, Result};

/// Handle to the hosted backend.
///
/// Cloning is cheap and clones share the session, so the identity facade and
/// the content store can hold the same signed-in state.
#[derive(Debug, Clone)]
pub struct Remote {
    http: reqwest::Client,
    config: RemoteConfig,
    session: Arc<Mutex<Option<Session>>>,
}

impl Remote {
    /// Build a handle over `config`.  Fails with
    /// [`RemoteError::NotConfigured`] while the config still carries the
    /// documentation placeholders; check [`RemoteConfig::is_configured`]
    /// first to fall back to local mode instead.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(RemoteError::NotConfigured);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            config,
            session: Arc::new(Mutex::new(None)),
        })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Session state
    // ------------------------------------------------------------------

    /// Install the session obtained from a sign-in or sign-up.
    pub fn set_session(&self, session: Session) {
        *self.lock_session() = Some(session);
    }

    /// Drop the current session, if any.
    pub fn clear_session(&self) {
        *self.lock_session() = None;
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Option<Session> {
        self.lock_session().clone()
    }

    /// The signed-in auth user, if any.
    pub fn session_user(&self) -> Option<AuthUser> {
        self.session().map(|s| s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock_session().is_some()
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        // a poisoned lock still holds a usable session value
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Request plumbing
    // ------------------------------------------------------------------

    /// Attach the API key and bearer token to a request.  Without a session
    /// the publishable key doubles as the bearer, which is how the backend
    /// expects anonymous reads.
    pub(crate) fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.config.api_key.clone());

        builder
            .header("apikey", &self.config.api_key)
            .bearer_auth(bearer)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The signed-in user, or an auth error for endpoints that require one.
    pub(crate) fn require_user(&self) -> Result<AuthUser> {
        self.session_user()
            .ok_or_else(|| RemoteError::Auth("no active session".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Fail with [`RemoteError::Api`] unless the response status is a success.
pub(crate) async fn expect_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::Api(format!(
        "backend responded {status}: {}",
        snippet(&body)
    )))
}

/// Decode a record store response into rows.
pub(crate) async fn read_rows<T: DeserializeOwned>(resp: Response) -> Result<Vec<T>> {
    let resp = expect_success(resp).await?;
    Ok(resp.json().await?)
}

/// Trim a response body to a loggable length.
pub(crate) fn snippet(body: &str) -> String {
    const MAX_CHARS: usize = 200;

    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_CHARS).collect();
        format!("{cut}...")
    }
}
