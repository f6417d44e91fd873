//! Archive → upload → share → summary

use crate::archive::{format_size, zip_source};
use crate::config::{RootNamespace, UploadRequest};
use crate::credentials::{self, StoredCredentials};
use crate::output::UploadResult;
use crate::{CliError, Result};
use chrono::Utc;
use dbxsend_client::{
    create_share_link, upload_file, CommitInfo, Config, DropboxClient, PkceFlow, ProgressCallback,
    ShareRequest, UploadProgress,
};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Run one upload from a validated request.
///
/// Stages run strictly in order and the first failure aborts the run. An
/// archive built before a failure is left on disk. The JSON summary is only
/// written once everything succeeded.
pub async fn run_upload(request: &UploadRequest, config: Config) -> Result<UploadResult> {
    let upload_path = match (&request.zip_path, request.zip) {
        (Some(zip_path), true) => {
            let password = if request.encrypt_archive {
                request.password.as_deref()
            } else {
                None
            };
            let summary = zip_source(&request.source, zip_path, password)?;
            debug!("archived {} files", summary.files);
            summary.path
        }
        _ => request.source.clone(),
    };

    if let Some(password) = &request.password {
        info!("The password is: {}", password);
    }

    let size = std::fs::metadata(&upload_path)?.len();
    info!("Uploading {} ({})", upload_path.display(), format_size(size));

    let client = DropboxClient::connect(config).await?;
    let client = match request.root {
        RootNamespace::Team => client.use_team_root().await?,
        RootNamespace::User => {
            warn!("Using 'user' namespace (this may not be what you wanted!)");
            client
        }
    };

    let commit = CommitInfo::new(request.destination.clone()).with_autorename(request.auto_rename);
    let progress: ProgressCallback = Box::new(|p: UploadProgress| {
        debug!(
            "chunk {}/{}: {} of {} bytes ({:.2}%)",
            p.current_chunk,
            p.total_chunks,
            p.bytes_uploaded,
            p.total_bytes,
            p.percentage()
        );
    });
    let metadata = upload_file(&client, &upload_path, &commit, Some(progress)).await?;
    let stored_path = metadata
        .path_display
        .clone()
        .unwrap_or_else(|| request.destination.clone());

    let link = match (request.share, request.expiration_days) {
        (true, Some(days)) => {
            if !request.share_delay.is_zero() {
                info!(
                    "sleeping {} seconds to make sure the file finishes upload",
                    request.share_delay.as_secs()
                );
                tokio::time::sleep(request.share_delay).await;
            }
            let share = ShareRequest {
                path: stored_path.clone(),
                password: request.password.clone(),
                expires_in_days: days,
            };
            let link = create_share_link(&client, &share).await?;
            info!("Expiration date is {}", link.expires.format("%Y-%m-%d"));
            Some(link)
        }
        _ => None,
    };

    let result = UploadResult {
        url: link.as_ref().map(|l| l.url.clone()),
        password: link.as_ref().and_then(|l| l.password.clone()),
        expiration_date: link.as_ref().map(|l| l.expires),
        size,
        source: request.source.clone(),
        destination: stored_path,
    };

    let json = result.to_json()?;
    if let Some(output) = &request.output {
        result.write_to(output)?;
    }
    info!("{}", json);
    debug!("Upload Complete!");

    Ok(result)
}

/// Interactive PKCE login; stores the tokens at `store`.
///
/// Reads the pasted code from `input` and prompts on `out`.
pub async fn authenticate<R: BufRead, W: Write>(
    config: Config,
    app_key: &str,
    store: &Path,
    mut input: R,
    mut out: W,
) -> Result<StoredCredentials> {
    let flow = PkceFlow::start(config, app_key);

    writeln!(out, "Login Here:\n{}", flow.authorize_url()?)?;
    write!(out, "Paste Access Code: ")?;
    out.flush()?;

    let mut code = String::new();
    input.read_line(&mut code)?;
    let code = code.trim();
    if code.is_empty() {
        return Err(CliError::InvalidArgument("no access code entered".to_string()));
    }

    let tokens = flow.finish(code).await.inspect_err(|_| {
        warn!("Maybe you pasted the wrong thing from the web site?");
    })?;

    let stored = StoredCredentials::from_tokens(app_key, &tokens, Utc::now());
    credentials::save(store, &stored)?;
    Ok(stored)
}
