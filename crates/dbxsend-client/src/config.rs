//! Client configuration

use crate::{ClientError, Result};
use std::fmt;
use std::time::Duration;

/// Largest body Dropbox accepts on a single upload or append call (150 MiB).
pub const MAX_SINGLE_REQUEST_SIZE: u64 = 150 * 1024 * 1024;

/// How the client authenticates
#[derive(Clone)]
pub enum Credentials {
    /// A ready-to-use access token
    AccessToken(String),
    /// A long-lived refresh token, exchanged for an access token on connect
    RefreshToken {
        app_key: String,
        refresh_token: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken(***)"),
            Self::RefreshToken { app_key, .. } => f
                .debug_struct("RefreshToken")
                .field("app_key", app_key)
                .field("refresh_token", &"***")
                .finish(),
        }
    }
}

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the RPC host (also serves `/oauth2/token`)
    pub api_url: String,
    /// Base URL of the content host (uploads)
    pub content_url: String,
    /// OAuth2 authorize page
    pub authorize_url: String,
    /// Credentials
    pub credentials: Option<Credentials>,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Files up to this size go up in one request (bytes)
    pub single_upload_threshold: u64,
    /// Upload session chunk size (bytes)
    pub chunk_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "https://api.dropboxapi.com".to_string(),
            content_url: "https://content.dropboxapi.com".to_string(),
            authorize_url: "https://www.dropbox.com/oauth2/authorize".to_string(),
            credentials: None,
            timeout: Duration::from_secs(900),
            user_agent: format!("dbxsend/{}", env!("CARGO_PKG_VERSION")),
            single_upload_threshold: 4 * 1024 * 1024, // 4 MiB
            chunk_size: 4 * 1024 * 1024,              // 4 MiB
        }
    }
}

impl Config {
    /// Point both API hosts at one base URL (handy for mock servers)
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.api_url = base.clone();
        self.content_url = base;
        self
    }

    /// Authenticate with a static access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::AccessToken(token.into()));
        self
    }

    /// Authenticate with a refresh token
    pub fn with_refresh_token(
        mut self,
        app_key: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::RefreshToken {
            app_key: app_key.into(),
            refresh_token: refresh_token.into(),
        });
        self
    }

    /// Use the given credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the upload session chunk size
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the single-request upload threshold
    pub fn with_single_upload_threshold(mut self, threshold: u64) -> Self {
        self.single_upload_threshold = threshold;
        self
    }

    /// Check the sizes against the backend's request limits
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ClientError::Config("chunk size must be positive".to_string()));
        }
        if self.chunk_size > MAX_SINGLE_REQUEST_SIZE {
            return Err(ClientError::Config(format!(
                "chunk size {} exceeds the {} byte request limit",
                self.chunk_size, MAX_SINGLE_REQUEST_SIZE
            )));
        }
        if self.single_upload_threshold > MAX_SINGLE_REQUEST_SIZE {
            return Err(ClientError::Config(format!(
                "single upload threshold {} exceeds the {} byte request limit",
                self.single_upload_threshold, MAX_SINGLE_REQUEST_SIZE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sizes_are_valid() {
        let config = Config::default();
        assert_eq!(config.chunk_size, 4 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_oversized_chunks() {
        let config = Config::default().with_chunk_size(MAX_SINGLE_REQUEST_SIZE + 1);
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        let config = Config::default().with_chunk_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let config = Config::default().with_refresh_token("app", "very-secret");
        let printed = format!("{:?}", config);
        assert!(printed.contains("app"));
        assert!(!printed.contains("very-secret"));
    }
}
