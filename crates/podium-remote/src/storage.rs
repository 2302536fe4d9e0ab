//! Object storage endpoints.
//!
//! Objects live under a per-user prefix (`{user_id}/{folder}/{object}`), so
//! bucket policies can scope writes to the owner.  Object names are
//! synthesised to avoid collisions between same-named uploads.

use bytes::Bytes;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::api::{expect_success, Remote};
use crate::error::Result;

/// Bucket holding media uploads.
pub const MEDIA_BUCKET: &str = "media-files";

/// Bucket holding avatar images.
pub const AVATAR_BUCKET: &str = "avatars";

/// Folder (within the user prefix) for media uploads.
pub const MEDIA_FOLDER: &str = "uploads";

/// Folder (within the user prefix) for profile avatars.
pub const AVATAR_FOLDER: &str = "profiles";

/// Result of a successful object upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Bucket-relative path of the stored object.
    pub path: String,
    /// Public download URL.
    pub public_url: String,
}

impl Remote {
    /// Upload `content` into `bucket` under the signed-in user's prefix and
    /// return where it ended up.
    pub async fn upload_object(
        &self,
        bucket: &str,
        folder: &str,
        file_name: &str,
        content_type: &str,
        content: Bytes,
    ) -> Result<StoredObject> {
        let user = self.require_user()?;

        let object = object_name(file_name, Utc::now().timestamp_millis());
        let path = format!("{}/{}/{}", user.id, folder, object);

        let resp = self
            .authed(self.http().post(self.config().object_url(bucket, &path)))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, "3600")
            // same-path uploads must fail rather than overwrite
            .header("x-upsert", "false")
            .body(content)
            .send()
            .await?;
        expect_success(resp).await?;

        let public_url = self.config().public_object_url(bucket, &path);
        debug!(bucket, path = %path, "object uploaded");

        Ok(StoredObject { path, public_url })
    }

    /// Remove a stored object by its bucket-relative path.
    pub async fn delete_object(&self, bucket: &str, path: &str) -> Result<()> {
        let resp = self
            .authed(self.http().delete(self.config().object_url(bucket, path)))
            .send()
            .await?;
        expect_success(resp).await?;

        debug!(bucket, path, "object deleted");
        Ok(())
    }
}

/// Collision-free object name: random stem plus a millisecond timestamp,
/// keeping the original extension.
fn object_name(file_name: &str, now_ms: i64) -> String {
    let stem = Uuid::new_v4().simple();

    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{stem}-{now_ms}.{ext}"),
        _ => format!("{stem}-{now_ms}"),
    }
}
