//! Upload and credential validation shared by both persistence modes.
//!
//! These checks run before any storage interaction, so an oversized or
//! mistyped file is rejected without touching the network or the local
//! database.

use crate::error::ValidationError;

/// Maximum avatar image size in bytes (5 MiB).
pub const MAX_AVATAR_BYTES: u64 = 5 * 1024 * 1024;

/// Maximum media upload size in bytes (50 MiB).
pub const MAX_MEDIA_BYTES: u64 = 50 * 1024 * 1024;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Broad media class, matched against the MIME type prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    Image,
    Video,
    Audio,
}

impl MediaClass {
    pub fn mime_prefix(self) -> &'static str {
        match self {
            MediaClass::Image => "image/",
            MediaClass::Video => "video/",
            MediaClass::Audio => "audio/",
        }
    }

    /// Prefix match only; subtypes are not inspected.
    pub fn matches(self, mime_type: &str) -> bool {
        mime_type.starts_with(self.mime_prefix())
    }
}

/// Classes accepted for media uploads.
const MEDIA_CLASSES: [MediaClass; 3] = [MediaClass::Image, MediaClass::Video, MediaClass::Audio];

/// Validate a password at registration time.
pub fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Validate an avatar upload: images only, at most [`MAX_AVATAR_BYTES`].
pub fn check_avatar_upload(mime_type: &str, size: u64) -> Result<(), ValidationError> {
    if !MediaClass::Image.matches(mime_type) {
        return Err(ValidationError::UnsupportedMediaType {
            mime_type: mime_type.to_string(),
        });
    }
    if size > MAX_AVATAR_BYTES {
        return Err(ValidationError::FileTooLarge {
            size,
            max: MAX_AVATAR_BYTES,
        });
    }
    Ok(())
}

/// Validate a media upload: image, video or audio, at most
/// [`MAX_MEDIA_BYTES`].
pub fn check_media_upload(mime_type: &str, size: u64) -> Result<(), ValidationError> {
    if !MEDIA_CLASSES.iter().any(|c| c.matches(mime_type)) {
        return Err(ValidationError::UnsupportedMediaType {
            mime_type: mime_type.to_string(),
        });
    }
    if size > MAX_MEDIA_BYTES {
        return Err(ValidationError::FileTooLarge {
            size,
            max: MAX_MEDIA_BYTES,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_length_boundary() {
        assert!(check_password("12345").is_err());
        assert!(check_password("123456").is_ok());
    }

    #[test]
    fn avatar_rejects_non_image() {
        let err = check_avatar_upload("video/mp4", 1024).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedMediaType { .. }));
    }

    #[test]
    fn avatar_size_boundary() {
        // exactly at the limit passes, one byte over fails
        assert!(check_avatar_upload("image/png", MAX_AVATAR_BYTES).is_ok());

        let err = check_avatar_upload("image/png", MAX_AVATAR_BYTES + 1).unwrap_err();
        assert_eq!(
            err,
            ValidationError::FileTooLarge {
                size: MAX_AVATAR_BYTES + 1,
                max: MAX_AVATAR_BYTES,
            }
        );
    }

    #[test]
    fn media_accepts_all_three_classes() {
        assert!(check_media_upload("image/png", 10).is_ok());
        assert!(check_media_upload("video/webm", 10).is_ok());
        assert!(check_media_upload("audio/ogg", 10).is_ok());
        assert!(check_media_upload("application/pdf", 10).is_err());
    }

    #[test]
    fn media_size_boundary() {
        assert!(check_media_upload("video/mp4", MAX_MEDIA_BYTES).is_ok());
        assert!(check_media_upload("video/mp4", MAX_MEDIA_BYTES + 1).is_err());
    }
}
