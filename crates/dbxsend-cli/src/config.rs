//! Validated upload request

use crate::args::{Args, RootArg};
use crate::password::generate_password;
use crate::{CliError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Link lifetime when sharing without an explicit expiration
pub const DEFAULT_EXPIRATION_DAYS: u32 = 14;

/// Namespace uploads resolve against
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RootNamespace {
    User,
    Team,
}

impl From<RootArg> for RootNamespace {
    fn from(arg: RootArg) -> Self {
        match arg {
            RootArg::Team => Self::Team,
            RootArg::User => Self::User,
        }
    }
}

/// One upload, checked once when built from the flags
#[derive(Clone, Debug)]
pub struct UploadRequest {
    /// Absolute local source
    pub source: PathBuf,
    /// Remote destination path
    pub destination: String,
    pub auto_rename: bool,
    pub root: RootNamespace,
    /// Set whenever a link is created
    pub expiration_days: Option<u32>,
    /// Link password (generated when zipping without one)
    pub password: Option<String>,
    pub zip: bool,
    /// Where the archive goes when zipping
    pub zip_path: Option<PathBuf>,
    pub encrypt_archive: bool,
    pub share: bool,
    pub share_delay: Duration,
    pub output: Option<PathBuf>,
}

impl UploadRequest {
    /// Validate the flags and fill in defaults
    pub fn from_args(args: &Args) -> Result<Self> {
        let source = args
            .source
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(CliError::MissingArgument("source"))?;
        if !source.exists() {
            return Err(CliError::SourceNotFound(source.clone()));
        }
        let source = std::path::absolute(source)?;

        let destination = args
            .destination
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or(CliError::MissingArgument("destination"))?;
        if !(destination.starts_with('/') || destination.starts_with("id:")) {
            return Err(CliError::InvalidArgument(format!(
                "destination {} must be an absolute Dropbox path starting with '/'",
                destination
            )));
        }

        if matches!(args.password.as_deref(), Some("")) {
            return Err(CliError::InvalidArgument("password must not be empty".to_string()));
        }
        if args.expiration_days == Some(0) {
            return Err(CliError::InvalidArgument(
                "expiration days must be at least 1".to_string(),
            ));
        }

        // A password only protects something when there is a link
        let share = args.zip || args.share || args.password.is_some();
        let password = match (&args.password, args.zip) {
            (Some(p), _) => Some(p.clone()),
            (None, true) => Some(generate_password()),
            (None, false) => None,
        };
        let expiration_days = share.then(|| args.expiration_days.unwrap_or(DEFAULT_EXPIRATION_DAYS));

        let zip_path = if args.zip {
            Some(match &args.zip_file_path {
                Some(p) => std::path::absolute(p)?,
                None => default_archive_path(&source, &std::env::current_dir()?),
            })
        } else {
            None
        };

        Ok(Self {
            source,
            destination: destination.to_string(),
            auto_rename: args.auto_rename,
            root: args.root.into(),
            expiration_days,
            password,
            zip: args.zip,
            zip_path,
            encrypt_archive: args.encrypt_zip,
            share,
            share_delay: Duration::from_secs(args.share_delay_secs),
            output: args.output.clone(),
        })
    }
}

/// `<dir>/<source stem>.zip`, or `<dir>/<dir name>.zip` when the source has no stem
pub fn default_archive_path(source: &Path, dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .or_else(|| dir.file_name().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "archive".to_string());
    dir.join(format!("{}.zip", stem))
}
