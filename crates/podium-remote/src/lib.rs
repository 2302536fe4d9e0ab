//! # podium-remote
//!
//! HTTP gateway to the hosted backend.
//!
//! The backend exposes three services under one base URL: an auth service
//! (`/auth/v1/*`), a record store (`/rest/v1/*`) and object storage
//! (`/storage/v1/*`).  This crate speaks their wire formats and normalises
//! every row into the canonical `podium-shared` models, so the divergent
//! column names (`file_type`, `file_size`, `avatar_url`, ...) never leak
//! past this boundary.
//!
//! [`Remote`] is a cheap-to-clone handle; the access token obtained at
//! sign-in is shared between clones.

pub mod api;
pub mod auth;
pub mod config;
pub mod records;
pub mod storage;

mod error;

pub use api::Remote;
pub use auth::{AuthUser, Session};
pub use config::RemoteConfig;
pub use error::RemoteError;
pub use storage::{StoredObject, AVATAR_BUCKET, AVATAR_FOLDER, MEDIA_BUCKET, MEDIA_FOLDER};
