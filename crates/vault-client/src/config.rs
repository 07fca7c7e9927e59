//! Client configuration.

use std::path::PathBuf;

use vault_core::defaults;

/// Where the client talks to and where it keeps its token.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the thoughtvault API.
    pub api_url: String,
    /// JSON file holding the persisted access token.
    pub token_path: PathBuf,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::API_URL.to_string(),
            token_path: default_token_path(),
            timeout_seconds: 30,
        }
    }
}

impl ClientConfig {
    /// Configuration for `api_url` with default token path and timeout.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    /// Read `THOUGHTVAULT_API_URL` and `THOUGHTVAULT_TOKEN_PATH`.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            api_url: std::env::var("THOUGHTVAULT_API_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(base.api_url),
            token_path: std::env::var_os("THOUGHTVAULT_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or(base.token_path),
            timeout_seconds: base.timeout_seconds,
        }
    }
}

/// `$HOME/.thoughtvault/token.json`, or relative to the working directory
/// when `HOME` is unset.
pub fn default_token_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".thoughtvault")
        .join("token.json")
}
