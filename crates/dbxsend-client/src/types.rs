//! Wire types for the Dropbox API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What to do when the destination path already holds a file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum WriteMode {
    /// Never overwrite; a different file at the path is a conflict
    #[default]
    Add,
    /// Replace whatever is there
    Overwrite,
}

/// Destination metadata sent with a single upload or a session finish
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Remote path
    pub path: String,
    /// Write mode
    pub mode: WriteMode,
    /// Let the server pick a free name on conflict.
    ///
    /// Identical content at the same path is not a conflict: the server keeps
    /// the existing file and returns its metadata even with this set.
    pub autorename: bool,
    /// Suppress desktop notifications
    pub mute: bool,
    /// Treat identical content as a conflict too (only honoured with `Overwrite`)
    pub strict_conflict: bool,
}

impl CommitInfo {
    /// Add a new file at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: WriteMode::Add,
            autorename: false,
            mute: false,
            strict_conflict: false,
        }
    }

    /// Set autorename
    pub fn with_autorename(mut self, autorename: bool) -> Self {
        self.autorename = autorename;
        self
    }

    /// Set the write mode
    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Position inside an upload session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSessionCursor {
    pub session_id: String,
    /// Bytes received by the server so far
    pub offset: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadSessionStartArg {
    pub close: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadSessionAppendArg<'a> {
    pub cursor: &'a UploadSessionCursor,
    pub close: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadSessionFinishArg<'a> {
    pub cursor: &'a UploadSessionCursor,
    pub commit: &'a CommitInfo,
}

/// Result of `upload_session/start`
#[derive(Clone, Debug, Deserialize)]
pub struct UploadSessionStartResult {
    pub session_id: String,
}

/// Metadata of a stored file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Last path component
    pub name: String,
    /// Stable file id (`id:...`)
    #[serde(default)]
    pub id: Option<String>,
    /// Path with the display casing, after any auto-rename
    #[serde(default)]
    pub path_display: Option<String>,
    /// Lowercased path
    #[serde(default)]
    pub path_lower: Option<String>,
    /// Size in bytes
    pub size: u64,
    /// Revision
    #[serde(default)]
    pub rev: Option<String>,
    /// Dropbox content hash
    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub client_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub server_modified: Option<DateTime<Utc>>,
}

/// Namespace that relative paths resolve against
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum PathRoot {
    /// The user's home namespace
    Home,
    /// The root namespace (the team space for team members)
    Root { root: String },
    /// An explicit namespace
    NamespaceId { namespace_id: String },
}

/// Root information of an account
#[derive(Clone, Debug, Deserialize)]
pub struct RootInfo {
    /// `user` or `team`
    #[serde(rename = ".tag")]
    pub tag: String,
    pub root_namespace_id: String,
    pub home_namespace_id: String,
}

/// Display name of an account
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AccountName {
    #[serde(default)]
    pub display_name: String,
}

/// Result of `users/get_current_account`
#[derive(Clone, Debug, Deserialize)]
pub struct FullAccount {
    pub account_id: String,
    #[serde(default)]
    pub name: AccountName,
    #[serde(default)]
    pub email: Option<String>,
    pub root_info: RootInfo,
}

/// Who can open a shared link
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum LinkAudience {
    Public,
    Team,
    NoOne,
}

/// Settings for a new shared link
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SharedLinkSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_password: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_password: Option<String>,
    /// Expiry, serialized as `YYYY-MM-DDTHH:MM:SSZ`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<LinkAudience>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_download: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateSharedLinkArg<'a> {
    pub path: &'a str,
    pub settings: &'a SharedLinkSettings,
}

/// Result of `sharing/create_shared_link_with_settings`
#[derive(Clone, Debug, Deserialize)]
pub struct SharedLinkMetadata {
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub path_lower: Option<String>,
    /// Expiry as stored by the server
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

/// Result of the OAuth2 token endpoint
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Only present for the authorization-code grant with offline access
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Absolute expiry computed from `expires_in`
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in.map(|secs| now + chrono::Duration::seconds(secs))
    }
}
