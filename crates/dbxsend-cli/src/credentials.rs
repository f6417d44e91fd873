//! Credential store
//!
//! Tokens live in a small JSON file (`~/.dbxsend.json` unless overridden);
//! `DROPBOX_*` environment variables are layered on top, so
//! `DROPBOX_ACCESS_TOKEN` alone is enough to run.

use crate::{CliError, Result};
use chrono::{DateTime, Utc};
use dbxsend_client::{Credentials, TokenResponse};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_FILE_NAME: &str = ".dbxsend.json";
const ENV_PREFIX: &str = "DROPBOX";

/// Stored tokens and app key
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("app_key", &self.app_key)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .field("account_id", &self.account_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl StoredCredentials {
    /// Build from a fresh token response
    pub fn from_tokens(app_key: &str, tokens: &TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            app_key: Some(app_key.to_string()),
            access_token: Some(tokens.access_token.clone()),
            refresh_token: tokens.refresh_token.clone(),
            account_id: tokens.account_id.clone(),
            scope: tokens.scope.clone(),
            expires_at: tokens.expires_at(now),
        }
    }

    /// Pick what the client authenticates with.
    ///
    /// A refresh token (with its app key) wins over an access token, since
    /// stored access tokens are short-lived.
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.app_key, &self.refresh_token, &self.access_token) {
            (Some(app_key), Some(refresh_token), _) => Ok(Credentials::RefreshToken {
                app_key: app_key.clone(),
                refresh_token: refresh_token.clone(),
            }),
            (_, _, Some(token)) => Ok(Credentials::AccessToken(token.clone())),
            _ => Err(CliError::MissingCredentials),
        }
    }
}

/// `~/.dbxsend.json`
pub fn default_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(DEFAULT_FILE_NAME))
}

/// Load the store (if present) with `DROPBOX_*` variables layered on top
pub fn load(path: Option<&Path>) -> Result<StoredCredentials> {
    load_with_env(path, None)
}

/// Same as [`load`], reading variables from `env` instead of the process
/// environment when given
fn load_with_env(
    path: Option<&Path>,
    env: Option<config::Map<String, String>>,
) -> Result<StoredCredentials> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        debug!("Loading configuration from {}", path.display());
        builder = builder.add_source(
            config::File::from(path)
                .format(config::FileFormat::Json)
                .required(false),
        );
    }
    let settings = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).source(env))
        .build()?;
    Ok(settings.try_deserialize()?)
}

/// Write the store, readable only by the owner on unix
pub fn save(path: &Path, credentials: &StoredCredentials) -> Result<()> {
    let json = serde_json::to_string_pretty(credentials)?;
    std::fs::write(path, json)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    info!("Configuration saved to {}", path.display());
    Ok(())
}
