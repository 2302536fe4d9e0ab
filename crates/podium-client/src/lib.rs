//! Client core for the Podium media-competition platform.
//!
//! Two facades cover everything a front end needs: [`Identity`] for
//! accounts and profiles, [`ContentStore`] for competitions, entries,
//! media files and votes.  Both target a hosted backend when
//! `PODIUM_BACKEND_URL` / `PODIUM_BACKEND_KEY` point at a real project and
//! fall back to a local SQLite store otherwise, so the client works out of
//! the box with no account anywhere.
//!
//! ```no_run
//! use podium_client::NewProfile;
//!
//! # async fn run() -> podium_client::Result<()> {
//! let (identity, content) = podium_client::bootstrap().await?;
//!
//! identity
//!     .register(
//!         "ada@example.com",
//!         "hunter22",
//!         NewProfile {
//!             name: "Ada".into(),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!
//! for competition in content.competitions() {
//!     println!("{} ({})", competition.title, competition.category);
//! }
//! # Ok(())
//! # }
//! ```

pub mod content;
pub mod identity;
pub mod uploads;

mod error;

use std::sync::{Arc, Mutex};

use tracing_subscriber::{fmt, EnvFilter};

use podium_remote::{Remote, RemoteConfig};
use podium_store::Database;

pub use crate::content::ContentStore;
pub use crate::error::{ClientError, Result};
pub use crate::identity::Identity;
pub use crate::uploads::MediaUpload;

// the facade signatures are written in terms of these
pub use podium_shared::{
    Category, Competition, CompetitionEntry, CompetitionStatus, MediaFile, NewCompetition,
    NewEntry, NewMediaFile, NewProfile, Profile, ProfileUpdate, ValidationError,
};

/// Install the global tracing subscriber.  `RUST_LOG` overrides the
/// default filter.  Call once, before [`bootstrap`].
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("podium_client=debug,podium_remote=debug,podium_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Wire up both facades from the environment: read the backend
/// configuration, open the local store, restore any persisted session and
/// load the content collections.
///
/// The identity facade initializes first; the content store consults the
/// resulting session to pick its data source.
pub async fn bootstrap() -> Result<(Identity, ContentStore)> {
    let config = RemoteConfig::from_env();
    let remote = if config.is_configured() {
        tracing::info!(url = %config.base_url, "using hosted backend");
        Some(Remote::new(config)?)
    } else {
        tracing::info!("no backend configured, using local storage");
        None
    };

    let store = Arc::new(Mutex::new(Database::new()?));

    let identity = Identity::new(remote.clone(), store.clone());
    identity.restore_session().await;

    let content = ContentStore::new(remote, store, identity.subscribe());
    content.load().await;

    Ok((identity, content))
}
