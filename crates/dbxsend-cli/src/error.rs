//! CLI error types

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CliError>;

/// Everything that can stop an upload run
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Must specify {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Source file/folder {} does not exist", .0.display())]
    SourceNotFound(PathBuf),

    #[error("The output zip {} already exists. If you want to re-run this, remove it first", .0.display())]
    ArchiveExists(PathBuf),

    #[error("No Dropbox credentials: set DROPBOX_ACCESS_TOKEN, or DROPBOX_APP_KEY and run `dbxsend --authenticate`")]
    MissingCredentials,

    #[error("Credential store error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Dropbox error: {0}")]
    Client(#[from] dbxsend_client::ClientError),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
