//! Persistence for the [`MediaFile`] collection.

use podium_shared::MediaFile;

use crate::database::{Database, KEY_MEDIA_FILES};
use crate::error::Result;

impl Database {
    /// Persist the full media file collection, replacing the previous
    /// snapshot.
    pub fn save_media_files(&self, files: &[MediaFile]) -> Result<()> {
        let json = serde_json::to_string(files)?;
        self.write_state(KEY_MEDIA_FILES, &json)
    }

    /// Load the media file collection.  An absent key yields an empty list.
    pub fn load_media_files(&self) -> Result<Vec<MediaFile>> {
        match self.read_state(KEY_MEDIA_FILES)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}
