//! Client error types

use serde::Deserialize;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint-specific API error (HTTP 409 and anything unclassified)
    #[error("Dropbox API error ({status}): {summary}")]
    Api {
        status: u16,
        summary: String,
        tag: Option<String>,
    },

    /// Malformed request (HTTP 400, plain-text body)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing, expired or revoked token (HTTP 401)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Token lacks the required scope or the app is not allowed (HTTP 403)
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Too many requests (HTTP 429)
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Upload failed
    #[error("Upload failed: {0}")]
    UploadFailed(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    error_summary: String,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl ClientError {
    /// Classify a failed response by status code and body
    pub fn from_response(status: u16, body: &str, retry_after: Option<u64>) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
        let summary = parsed
            .as_ref()
            .map(|b| b.error_summary.clone())
            .unwrap_or_else(|| body.trim().to_string());
        let tag = parsed
            .as_ref()
            .and_then(|b| b.error.as_ref())
            .and_then(|e| e.get(".tag"))
            .and_then(|t| t.as_str())
            .map(|s| s.to_string());

        match status {
            400 => Self::BadRequest(summary),
            401 => Self::Auth(summary),
            403 => Self::AccessDenied(summary),
            429 => Self::RateLimited { retry_after },
            _ => Self::Api { status, summary, tag },
        }
    }

    /// Name collision or an already existing shared link
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { summary, .. }
            if summary.contains("conflict") || summary.contains("already_exists"))
    }

    /// Out of space, out of quota, or throttled
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
            || matches!(self, Self::Api { summary, .. }
                if summary.contains("insufficient_space")
                    || summary.contains("insufficient_quota")
                    || summary.contains("too_many_write_operations"))
    }

    /// The account or token is not allowed to do this
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
            || matches!(self, Self::Api { summary, .. }
                if summary.contains("access_denied")
                    || summary.contains("email_not_verified")
                    || summary.contains("settings_error"))
    }

    /// The token is missing or no longer valid
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
