//! # podium-shared
//!
//! Canonical domain model for the Podium competition platform.
//!
//! Every other crate in the workspace speaks these types: the local store
//! persists them as JSON, the remote gateway normalises backend rows into
//! them, and the client facades hand them to callers.  Field validation that
//! must hold in both local and backend mode also lives here.

pub mod models;
pub mod types;
pub mod validation;

mod error;

pub use error::ValidationError;
pub use models::*;
pub use types::*;
