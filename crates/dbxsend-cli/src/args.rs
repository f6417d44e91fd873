//! Command-line flags

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "dbxsend")]
#[command(about = "Send exactly one file to Dropbox")]
#[command(version)]
pub struct Args {
    /// Source file or folder to copy from on this computer
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Destination path in Dropbox, e.g. /CompanyShare/zips/18-AK.zip
    #[arg(short, long)]
    pub destination: Option<String>,

    /// Only authenticate (store a refresh token) without transferring
    #[arg(short, long)]
    pub authenticate: bool,

    /// On a name conflict, have Dropbox auto-rename the uploaded file (short form is `--ar`, not `-ar`)
    #[arg(long = "auto-rename", visible_alias = "ar")]
    pub auto_rename: bool,

    /// Create a zip file of the source and upload that zip
    #[arg(short, long)]
    pub zip: bool,

    /// Password for the shared link (implies --share; also the zip with --encrypt-zip); generated when zipping without one
    #[arg(short, long)]
    pub password: Option<String>,

    /// Also AES-encrypt the zip with the password
    #[arg(long, requires = "zip")]
    pub encrypt_zip: bool,

    /// Days until the download link expires (default 14)
    #[arg(long = "expiration-days", visible_alias = "ed")]
    pub expiration_days: Option<u32>,

    /// With -z, the full zip file path, like /tmp/123456-AB.zip (default ./<source>.zip)
    #[arg(long = "zip-file-path", visible_alias = "zfp")]
    pub zip_file_path: Option<PathBuf>,

    /// Create a shared link even without -z
    #[arg(long)]
    pub share: bool,

    /// Where to write a JSON summary (URL, password, size, paths)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Namespace to upload into
    #[arg(long, value_enum, default_value_t = RootArg::Team)]
    pub root: RootArg,

    /// Seconds to wait after uploading before creating the link
    #[arg(long, default_value_t = 10)]
    pub share_delay_secs: u64,

    /// Logging level
    #[arg(short, long = "log-level", value_enum, default_value_t = LogLevel::Warning)]
    pub log_level: LogLevel,

    /// Credential store file (default ~/.dbxsend.json)
    #[arg(long, env = "DBXSEND_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Root namespace selector
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RootArg {
    /// The team (organization) root
    Team,
    /// Your own home folder
    User,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    /// Directive for `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}
