//! Helpers shared by the avatar and media upload paths.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;

/// Where an upload ended up, in either persistence mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    /// URL the file is served from (public object URL or data URL).
    pub url: String,
    /// Object storage path; `None` for local-mode data URLs.
    pub storage_path: Option<String>,
}

/// Embed `content` in a `data:` URL, the local-mode stand-in for object
/// storage.
pub(crate) fn data_url(mime_type: &str, content: &Bytes) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(content))
}
