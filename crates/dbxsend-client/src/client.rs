//! Main client implementation

use crate::{
    oauth,
    types::*,
    ClientError, Config, Credentials, Result,
};
use bytes::Bytes;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};

const API_ARG_HEADER: &str = "Dropbox-API-Arg";
const PATH_ROOT_HEADER: &str = "Dropbox-API-Path-Root";

/// Dropbox API client
pub struct DropboxClient {
    config: Config,
    http: Client,
    access_token: String,
    path_root: Option<PathRoot>,
}

impl DropboxClient {
    /// Create a client, exchanging a refresh token for an access token if needed
    pub async fn connect(config: Config) -> Result<Self> {
        config.validate()?;
        let http = http_client(&config)?;

        let access_token = match &config.credentials {
            Some(Credentials::AccessToken(token)) => {
                debug!("using static access token");
                token.clone()
            }
            Some(Credentials::RefreshToken { app_key, refresh_token }) => {
                debug!("refreshing access token");
                oauth::refresh_with(&http, &config, app_key, refresh_token)
                    .await?
                    .access_token
            }
            None => {
                return Err(ClientError::Config(
                    "no Dropbox credentials configured".to_string(),
                ))
            }
        };

        Ok(Self {
            config,
            http,
            access_token,
            path_root: None,
        })
    }

    /// Create a client around an access token that is already known
    pub fn with_access_token(config: Config, access_token: impl Into<String>) -> Result<Self> {
        config.validate()?;
        let http = http_client(&config)?;
        Ok(Self {
            config,
            http,
            access_token: access_token.into(),
            path_root: None,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve paths against `root` on every following call
    pub fn with_path_root(mut self, root: PathRoot) -> Self {
        self.path_root = Some(root);
        self
    }

    /// The path root in effect, if any
    pub fn path_root(&self) -> Option<&PathRoot> {
        self.path_root.as_ref()
    }

    /// Switch to the account's root namespace.
    ///
    /// For team members this is the team space; without it uploads land under
    /// the member's own folder inside the team space.
    pub async fn use_team_root(self) -> Result<Self> {
        let account = self.current_account().await?;
        let root = account.root_info.root_namespace_id;
        debug!("Using team namespace id {}", root);
        Ok(self.with_path_root(PathRoot::Root { root }))
    }

    // ==================== Account ====================

    /// Get the account the token belongs to
    #[instrument(skip(self))]
    pub async fn current_account(&self) -> Result<FullAccount> {
        self.rpc("users/get_current_account", &()).await
    }

    // ==================== Uploads ====================

    /// Upload a whole file in one request (at most 150 MiB)
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub async fn upload(&self, data: Bytes, commit: &CommitInfo) -> Result<FileMetadata> {
        self.content("files/upload", commit, data).await
    }

    /// Open an upload session with its first chunk
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub async fn upload_session_start(&self, data: Bytes) -> Result<UploadSessionStartResult> {
        self.content(
            "files/upload_session/start",
            &UploadSessionStartArg { close: false },
            data,
        )
        .await
    }

    /// Append a chunk at `cursor.offset`
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub async fn upload_session_append(
        &self,
        cursor: &UploadSessionCursor,
        data: Bytes,
    ) -> Result<()> {
        let arg = UploadSessionAppendArg { cursor, close: false };
        self.content_raw("files/upload_session/append_v2", &arg, data)
            .await?;
        Ok(())
    }

    /// Send the last chunk and commit the session to `commit.path`
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub async fn upload_session_finish(
        &self,
        cursor: &UploadSessionCursor,
        commit: &CommitInfo,
        data: Bytes,
    ) -> Result<FileMetadata> {
        let arg = UploadSessionFinishArg { cursor, commit };
        self.content("files/upload_session/finish", &arg, data).await
    }

    // ==================== Sharing ====================

    /// Create a shared link for `path`
    #[instrument(skip(self, settings))]
    pub async fn create_shared_link_with_settings(
        &self,
        path: &str,
        settings: &SharedLinkSettings,
    ) -> Result<SharedLinkMetadata> {
        self.rpc(
            "sharing/create_shared_link_with_settings",
            &CreateSharedLinkArg { path, settings },
        )
        .await
    }

    // ==================== Helper Methods ====================

    async fn rpc<A: Serialize, R: DeserializeOwned>(&self, endpoint: &str, arg: &A) -> Result<R> {
        let url = format!("{}/2/{}", self.config.api_url, endpoint);
        let body = serde_json::to_vec(arg)?;

        let req = self
            .http
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body);

        let response = self.send(req, &url).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn content<A: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        arg: &A,
        data: Bytes,
    ) -> Result<R> {
        let response = self.content_raw(endpoint, arg, data).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn content_raw<A: Serialize>(
        &self,
        endpoint: &str,
        arg: &A,
        data: Bytes,
    ) -> Result<Response> {
        let url = format!("{}/2/{}", self.config.content_url, endpoint);

        let req = self
            .http
            .post(&url)
            .header(API_ARG_HEADER, encode_api_arg(arg)?)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(data);

        self.send(req, &url).await
    }

    async fn send(&self, mut req: RequestBuilder, url: &str) -> Result<Response> {
        req = req.bearer_auth(&self.access_token);

        if let Some(root) = &self.path_root {
            req = req.header(PATH_ROOT_HEADER, serde_json::to_string(root)?);
        }

        debug!("Sending request to {}", url);
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status.as_u16(), &text, retry_after));
        }

        Ok(response)
    }
}

/// Build the HTTP client shared by API calls and the token endpoint
pub(crate) fn http_client(config: &Config) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    let user_agent = header::HeaderValue::from_str(&config.user_agent)
        .map_err(|e| ClientError::Config(format!("invalid user agent: {}", e)))?;
    headers.insert(header::USER_AGENT, user_agent);

    Client::builder()
        .timeout(config.timeout)
        .default_headers(headers)
        .build()
        .map_err(ClientError::Http)
}

/// JSON for the `Dropbox-API-Arg` header.
///
/// Header values must be ASCII, so every non-ASCII character is written as a
/// `\uXXXX` escape (surrogate pairs above the BMP).
pub(crate) fn encode_api_arg<A: Serialize>(arg: &A) -> Result<String> {
    let json = serde_json::to_string(arg)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_arg_escapes_non_ascii() {
        let commit = CommitInfo::new("/Fotos/Müller 🚀.jpg");
        let encoded = encode_api_arg(&commit).unwrap();

        assert!(encoded.is_ascii());
        assert!(encoded.contains(r"M\u00fcller"));
        assert!(encoded.contains(r"\ud83d\ude80"));

        // Escapes are still valid JSON for the same value
        let decoded: CommitInfo = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, commit);
    }

    #[test]
    fn test_with_access_token_validates_config() {
        let config = Config::default().with_chunk_size(0);
        assert!(DropboxClient::with_access_token(config, "token").is_err());

        let client = DropboxClient::with_access_token(Config::default(), "token").unwrap();
        assert!(client.path_root().is_none());
    }

    #[tokio::test]
    async fn test_connect_requires_credentials() {
        let err = DropboxClient::connect(Config::default()).await.err().unwrap();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
