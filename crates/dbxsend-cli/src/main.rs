//! dbxsend - upload a file or zipped folder to Dropbox

use anyhow::Context;
use clap::Parser;
use dbxsend_cli::{authenticate, credentials, run_upload, Args, UploadRequest};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = args.log_level.as_filter();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("dbxsend_cli={level},dbxsend_client={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let store = args.config.clone().or_else(credentials::default_path);
    let stored = credentials::load(store.as_deref())?;
    let client_config = dbxsend_client::Config::default();

    if args.authenticate {
        let app_key = stored
            .app_key
            .clone()
            .context("DROPBOX_APP_KEY must be set to authenticate")?;
        let store = store.context("no place to store credentials: set HOME or DBXSEND_CONFIG")?;
        let stdin = std::io::stdin();
        authenticate(client_config, &app_key, &store, stdin.lock(), std::io::stdout()).await?;
        return Ok(());
    }

    let request = UploadRequest::from_args(&args)?;
    let client_config = client_config.with_credentials(stored.credentials()?);

    run_upload(&request, client_config).await?;
    Ok(())
}
