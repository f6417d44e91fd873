//! Expiring, download-only shared links

use crate::{
    types::{LinkAudience, SharedLinkSettings},
    ClientError, DropboxClient, Result,
};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// What to share and how
#[derive(Clone, Debug)]
pub struct ShareRequest {
    /// Remote path of the file
    pub path: String,
    /// Password required to open the link
    pub password: Option<String>,
    /// Link lifetime in days
    pub expires_in_days: u32,
}

/// A created link
#[derive(Clone, Debug, Serialize)]
pub struct SharedLink {
    /// Download-only URL (`dl=1`)
    pub url: String,
    /// Password set on the link
    pub password: Option<String>,
    /// Expiry as reported by the server, or as requested if it did not say
    pub expires: DateTime<Utc>,
}

/// Create a public, download-only link that expires `expires_in_days` from now
pub async fn create_share_link(client: &DropboxClient, request: &ShareRequest) -> Result<SharedLink> {
    create_share_link_at(client, request, Utc::now()).await
}

/// Same as [`create_share_link`] with an explicit clock
pub async fn create_share_link_at(
    client: &DropboxClient,
    request: &ShareRequest,
    now: DateTime<Utc>,
) -> Result<SharedLink> {
    let requested_expiry = now.trunc_subsecs(0) + Duration::days(i64::from(request.expires_in_days));

    let settings = SharedLinkSettings {
        require_password: Some(request.password.is_some()),
        link_password: request.password.clone(),
        expires: Some(requested_expiry),
        audience: Some(LinkAudience::Public),
        allow_download: Some(true),
    };
    debug!(
        "Shared link settings: public, download allowed, expires {}, password required: {}",
        requested_expiry,
        request.password.is_some()
    );

    let metadata = client
        .create_shared_link_with_settings(&request.path, &settings)
        .await?;
    info!("{}", metadata.url);

    Ok(SharedLink {
        url: download_only_url(&metadata.url)?,
        password: request.password.clone(),
        expires: metadata.expires.unwrap_or(requested_expiry),
    })
}

/// Force a download instead of the preview page by turning `dl=0` into `dl=1`.
///
/// Other query parameters (such as `rlkey`) are kept in order.
pub fn download_only_url(link: &str) -> Result<String> {
    let mut url = url::Url::parse(link)
        .map_err(|e| ClientError::InvalidResponse(format!("bad shared link {}: {}", link, e)))?;

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let dl_values: Vec<&str> = pairs
        .iter()
        .filter(|(k, _)| k == "dl")
        .map(|(_, v)| v.as_str())
        .collect();

    if dl_values == ["0"] {
        let rewritten: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| if k == "dl" { (k, "1".to_string()) } else { (k, v) })
            .collect();
        url.query_pairs_mut().clear().extend_pairs(rewritten);
    }

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_only_url() {
        let url = "https://www.dropbox.com/scl/fi/0l2yq2bjqvnzlzwfqh3h4/18-AK.zip?rlkey=97yz7amqzzoxz5q86vs1e2m7g&dl=0";
        assert_eq!(
            download_only_url(url).unwrap(),
            "https://www.dropbox.com/scl/fi/0l2yq2bjqvnzlzwfqh3h4/18-AK.zip?rlkey=97yz7amqzzoxz5q86vs1e2m7g&dl=1"
        );
    }

    #[test]
    fn test_download_only_url_leaves_others_alone() {
        let already = "https://www.dropbox.com/s/abc/file.zip?dl=1";
        assert_eq!(download_only_url(already).unwrap(), already);

        let no_dl = "https://www.dropbox.com/s/abc/file.zip?rlkey=x";
        assert_eq!(download_only_url(no_dl).unwrap(), no_dl);

        assert!(download_only_url("not a url").is_err());
    }
}
