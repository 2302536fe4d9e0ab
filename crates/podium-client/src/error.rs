use thiserror::Error;

use podium_remote::RemoteError;
use podium_shared::ValidationError;
use podium_store::StoreError;

/// Errors surfaced by the client facades.
///
/// Expected outcomes are not errors: a duplicate vote is a `false` return,
/// not a variant here.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Sign-in and related flows need a configured backend; local mode
    /// establishes identity through registration only.
    #[error("Sign-in requires a configured backend")]
    AuthRequiresBackend,

    /// Operation needs a signed-in user.
    #[error("No user is signed in")]
    NotAuthenticated,

    /// Client-side field validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The backend rejected or failed an operation.
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The local store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
