//! # dbxsend
//!
//! Send exactly one file to Dropbox, optionally zipping a directory first and
//! sharing the result through a password-protected, expiring link.
//!
//! ```text
//!  flags ──► UploadRequest ──► [zip] ──► upload ──► [share link] ──► JSON summary
//!                                │          │             │
//!                             archive    dbxsend-client (sessions, links)
//! ```
//!
//! Every stage runs to completion before the next one starts; the first
//! failure ends the run.

pub mod archive;
pub mod args;
pub mod config;
pub mod credentials;
pub mod error;
pub mod output;
pub mod password;
pub mod pipeline;

pub use args::{Args, LogLevel, RootArg};
pub use config::{RootNamespace, UploadRequest};
pub use error::{CliError, Result};
pub use output::UploadResult;
pub use pipeline::{authenticate, run_upload};
