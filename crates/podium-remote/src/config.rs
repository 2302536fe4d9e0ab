//! Backend configuration loaded from environment variables.
//!
//! The defaults are deliberately the documentation placeholders: a build
//! that was never pointed at a real project reports itself as unconfigured
//! and the client falls back to local storage instead of dialling a dead
//! URL.

/// Placeholder base URL shipped in documentation and env templates.
pub const PLACEHOLDER_URL: &str = "https://your-project-id.example.com";

/// Placeholder publishable API key shipped in documentation.
pub const PLACEHOLDER_KEY: &str = "your-anon-key";

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL of the backend project, without a trailing slash.
    /// Env: `PODIUM_BACKEND_URL`
    pub base_url: String,

    /// Publishable (anonymous) API key.
    /// Env: `PODIUM_BACKEND_KEY`
    pub api_key: String,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Load configuration from environment variables, falling back to the
    /// placeholders (i.e. unconfigured).
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("PODIUM_BACKEND_URL").unwrap_or_else(|_| PLACEHOLDER_URL.to_string());
        let api_key =
            std::env::var("PODIUM_BACKEND_KEY").unwrap_or_else(|_| PLACEHOLDER_KEY.to_string());

        Self::new(base_url, api_key)
    }

    /// Whether a real backend is configured.  Empty values and the
    /// documentation placeholders both count as "not configured".
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
            && !self.api_key.is_empty()
            && self.base_url != PLACEHOLDER_URL
            && self.api_key != PLACEHOLDER_KEY
    }

    // ------------------------------------------------------------------
    // Endpoint builders
    // ------------------------------------------------------------------

    /// URL of an auth service endpoint, e.g. `signup` or `token`.
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// URL of a record store table.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// URL of a server-side function.
    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    /// Upload URL of an object within a bucket.
    pub fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }

    /// Public (unauthenticated) download URL of an object.
    pub fn public_object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_unconfigured() {
        let config = RemoteConfig::new(PLACEHOLDER_URL, PLACEHOLDER_KEY);
        assert!(!config.is_configured());

        let config = RemoteConfig::new("", "");
        assert!(!config.is_configured());

        // one real value is not enough
        let config = RemoteConfig::new("https://proj.example.com", PLACEHOLDER_KEY);
        assert!(!config.is_configured());
    }

    #[test]
    fn test_real_values_are_configured() {
        let config = RemoteConfig::new("https://proj.example.com", "key-123");
        assert!(config.is_configured());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = RemoteConfig::new("https://proj.example.com/", "key-123");
        assert_eq!(config.base_url, "https://proj.example.com");
        assert_eq!(
            config.auth_url("token"),
            "https://proj.example.com/auth/v1/token"
        );
    }

    #[test]
    fn test_endpoint_builders() {
        let config = RemoteConfig::new("https://proj.example.com", "key-123");

        assert_eq!(
            config.table_url("competitions"),
            "https://proj.example.com/rest/v1/competitions"
        );
        assert_eq!(
            config.rpc_url("increment_entry_votes"),
            "https://proj.example.com/rest/v1/rpc/increment_entry_votes"
        );
        assert_eq!(
            config.object_url("avatars", "u1/profiles/a.png"),
            "https://proj.example.com/storage/v1/object/avatars/u1/profiles/a.png"
        );
        assert_eq!(
            config.public_object_url("avatars", "u1/profiles/a.png"),
            "https://proj.example.com/storage/v1/object/public/avatars/u1/profiles/a.png"
        );
    }
}
