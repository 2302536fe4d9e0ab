use thiserror::Error;

/// Errors produced by the remote gateway.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// No backend is configured (placeholder or empty credentials).
    #[error("No backend is configured")]
    NotConfigured,

    /// Sign-in rejected by the auth service.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Any other auth service failure.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Record or storage request rejected by the backend.
    #[error("Backend request failed: {0}")]
    Api(String),

    /// Network-level failure (DNS, TLS, timeouts, malformed bodies).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RemoteError>;
