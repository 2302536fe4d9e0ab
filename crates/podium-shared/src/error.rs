use thiserror::Error;

/// Errors produced by field validation before any storage interaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Password shorter than the minimum length.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    /// Upload larger than the per-kind ceiling.
    #[error("File too large: {size} bytes (maximum {max})")]
    FileTooLarge { size: u64, max: u64 },

    /// MIME type outside the accepted media classes.
    #[error("Unsupported file type: {mime_type}")]
    UnsupportedMediaType { mime_type: String },
}
