//! # dbxsend client
//!
//! A small typed client for the Dropbox v2 HTTP API, covering what it takes
//! to push one file and share it.
//!
//! ## Features
//!
//! - **Uploads**: single-request upload for small files, upload sessions
//!   (start/append/finish) for everything larger
//! - **Integrity**: Dropbox content hash computed while streaming and checked
//!   against the server's answer
//! - **Shared links**: public, download-only, optionally password protected
//!   and expiring
//! - **OAuth2**: PKCE "no redirect" flow and refresh-token exchange
//! - **Team spaces**: switch the path root to the team root namespace
//!
//! ## Example
//!
//! ```rust,ignore
//! use dbxsend_client::{CommitInfo, Config, DropboxClient, upload_file};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DropboxClient::connect(Config::default().with_token("sl.xxx"))
//!         .await?
//!         .use_team_root()
//!         .await?;
//!
//!     let commit = CommitInfo::new("/reports/2024.zip").with_autorename(true);
//!     let metadata = upload_file(&client, "2024.zip".as_ref(), &commit, None).await?;
//!     println!("stored at {:?}", metadata.path_display);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod content_hash;
mod error;
mod oauth;
mod session;
mod share;
mod types;

pub use client::DropboxClient;
pub use config::{Config, Credentials, MAX_SINGLE_REQUEST_SIZE};
pub use content_hash::{content_hash, ContentHasher, BLOCK_SIZE};
pub use error::{ClientError, Result};
pub use oauth::{refresh_access_token, PkceFlow};
pub use session::{upload_file, ProgressCallback, UploadProgress, UploadSession};
pub use share::{create_share_link, create_share_link_at, download_only_url, ShareRequest, SharedLink};
pub use types::*;
