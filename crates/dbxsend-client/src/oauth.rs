//! OAuth2 token handling
//!
//! Two flows are supported: the PKCE "no redirect" flow, where the user opens
//! an authorize URL and pastes back a code, and the refresh-token grant used
//! on every later run.

use crate::{client::http_client, types::TokenResponse, ClientError, Config, Result};
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse, BasicTokenType};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RefreshToken, RequestTokenError,
    TokenResponse as _, TokenUrl,
};
use reqwest::Client;
use tracing::debug;

type DropboxOAuthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// An authorization started with PKCE, waiting for the pasted code
pub struct PkceFlow {
    config: Config,
    app_key: String,
    challenge: PkceCodeChallenge,
    verifier: PkceCodeVerifier,
}

impl PkceFlow {
    /// Start a flow with a fresh random code verifier
    pub fn start(config: Config, app_key: impl Into<String>) -> Self {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        Self {
            config,
            app_key: app_key.into(),
            challenge,
            verifier,
        }
    }

    /// S256 code challenge for the verifier
    pub fn code_challenge(&self) -> &str {
        self.challenge.as_str()
    }

    /// URL the user opens to grant access (offline access, so a refresh token is issued)
    pub fn authorize_url(&self) -> Result<String> {
        let client = oauth_client(&self.config, &self.app_key)?;
        let (url, _state) = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(self.challenge.clone())
            .add_extra_param("token_access_type", "offline")
            .url();
        Ok(url.into())
    }

    /// Exchange the pasted authorization code for tokens
    pub async fn finish(self, code: &str) -> Result<TokenResponse> {
        let http = http_client(&self.config)?;
        let client = oauth_client(&self.config, &self.app_key)?;

        debug!("Getting oauth tokens...");
        let tokens = client
            .exchange_code(AuthorizationCode::new(code.trim().to_string()))
            .set_pkce_verifier(self.verifier)
            .request_async(&http)
            .await
            .map_err(token_error)?;
        Ok(token_response(&tokens))
    }
}

/// Exchange a refresh token for a short-lived access token
pub async fn refresh_access_token(
    config: &Config,
    app_key: &str,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let http = http_client(config)?;
    refresh_with(&http, config, app_key, refresh_token).await
}

pub(crate) async fn refresh_with(
    http: &Client,
    config: &Config,
    app_key: &str,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let client = oauth_client(config, app_key)?;
    let refresh_token = RefreshToken::new(refresh_token.to_string());
    let tokens = client
        .exchange_refresh_token(&refresh_token)
        .request_async(http)
        .await
        .map_err(token_error)?;
    Ok(token_response(&tokens))
}

/// Public client: no secret, the app key travels in the form body
fn oauth_client(config: &Config, app_key: &str) -> Result<DropboxOAuthClient> {
    let auth_url = AuthUrl::new(config.authorize_url.clone())
        .map_err(|e| ClientError::Config(format!("invalid authorize URL: {}", e)))?;
    let token_url = TokenUrl::new(format!("{}/oauth2/token", config.api_url))
        .map_err(|e| ClientError::Config(format!("invalid token URL: {}", e)))?;

    Ok(BasicClient::new(ClientId::new(app_key.to_string()))
        .set_auth_type(AuthType::RequestBody)
        .set_auth_uri(auth_url)
        .set_token_uri(token_url))
}

fn token_response(tokens: &BasicTokenResponse) -> TokenResponse {
    TokenResponse {
        access_token: tokens.access_token().secret().clone(),
        token_type: matches!(tokens.token_type(), BasicTokenType::Bearer).then(|| "bearer".to_string()),
        expires_in: tokens.expires_in().map(|d| d.as_secs() as i64),
        refresh_token: tokens.refresh_token().map(|t| t.secret().clone()),
        account_id: None,
        scope: tokens.scopes().map(|scopes| {
            scopes
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        }),
    }
}

fn token_error<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> ClientError
where
    RE: std::error::Error + 'static,
{
    match err {
        // {"error": ..., "error_description": ...}
        RequestTokenError::ServerResponse(resp) => ClientError::Auth(format!(
            "token request failed: {}",
            resp.error_description()
                .cloned()
                .unwrap_or_else(|| resp.to_string())
        )),
        RequestTokenError::Request(e) => ClientError::Auth(format!("token request failed: {}", e)),
        RequestTokenError::Parse(e, _) => {
            ClientError::InvalidResponse(format!("bad token response: {}", e))
        }
        RequestTokenError::Other(message) => ClientError::Auth(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_derives_from_verifier() {
        let flow = PkceFlow::start(Config::default(), "my-app-key");
        let expected = PkceCodeChallenge::from_code_verifier_sha256(&flow.verifier);
        assert_eq!(flow.code_challenge(), expected.as_str());
        assert_eq!(flow.challenge.method().as_str(), "S256");
    }

    #[test]
    fn test_authorize_url_parameters() {
        let flow = PkceFlow::start(Config::default(), "my-app-key");

        let url = url::Url::parse(&flow.authorize_url().unwrap()).unwrap();
        assert_eq!(url.host_str(), Some("www.dropbox.com"));

        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "my-app-key");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["token_access_type"], "offline");
        assert_eq!(params["code_challenge"], flow.code_challenge());
        assert!(!params.contains_key("redirect_uri"));
    }

    #[test]
    fn test_each_flow_gets_its_own_verifier() {
        let a = PkceFlow::start(Config::default(), "k");
        let b = PkceFlow::start(Config::default(), "k");
        assert_ne!(a.verifier.secret(), b.verifier.secret());
    }

    #[test]
    fn test_bad_token_url_is_config_error() {
        let config = Config {
            api_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(oauth_client(&config, "k"), Err(ClientError::Config(_))));
    }
}
