//! Upload sessions for large files

use crate::{
    types::{CommitInfo, FileMetadata, UploadSessionCursor},
    ClientError, ContentHasher, DropboxClient, Result,
};
use bytes::Bytes;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Called once per request the server has accepted
pub type ProgressCallback = Box<dyn Fn(UploadProgress) + Send + Sync>;

/// Where an upload stands after a request.
///
/// Chunks are numbered by request: 1 is the single upload or the session
/// start, and the last one is the finish call, which may carry no bytes.
#[derive(Clone, Debug)]
pub struct UploadProgress {
    /// Bytes the server holds, equal to the session cursor offset
    pub bytes_uploaded: u64,
    /// Size of the local file
    pub total_bytes: u64,
    /// Request number, 1-based
    pub current_chunk: u32,
    /// Requests this upload takes in total
    pub total_chunks: u32,
}

impl UploadProgress {
    /// Share of the file accepted so far; an empty file counts as done
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        (self.bytes_uploaded as f64 / self.total_bytes as f64) * 100.0
    }
}

/// An open upload session.
///
/// Chunks go up strictly in order; the cursor offset always equals the number
/// of bytes the server has accepted.
pub struct UploadSession<'a> {
    client: &'a DropboxClient,
    cursor: UploadSessionCursor,
}

impl<'a> UploadSession<'a> {
    /// Open a session with the first chunk
    pub async fn start(client: &'a DropboxClient, first: Bytes) -> Result<Self> {
        let len = first.len() as u64;
        let started = client.upload_session_start(first).await?;
        debug!("started upload session {}", started.session_id);

        Ok(Self {
            client,
            cursor: UploadSessionCursor {
                session_id: started.session_id,
                offset: len,
            },
        })
    }

    /// Append the next chunk
    pub async fn append(&mut self, data: Bytes) -> Result<()> {
        let len = data.len() as u64;
        self.client.upload_session_append(&self.cursor, data).await?;
        self.cursor.offset += len;
        Ok(())
    }

    /// Send the last chunk and commit
    pub async fn finish(self, data: Bytes, commit: &CommitInfo) -> Result<FileMetadata> {
        self.client
            .upload_session_finish(&self.cursor, commit, data)
            .await
    }

    /// Get the session ID
    pub fn session_id(&self) -> &str {
        &self.cursor.session_id
    }

    /// Bytes accepted so far
    pub fn offset(&self) -> u64 {
        self.cursor.offset
    }
}

/// Upload a local file to `commit.path`.
///
/// Files up to the configured threshold go up in one request; anything larger
/// goes through an upload session. The server's content hash is checked
/// against the bytes that were read.
///
/// If the destination already holds a file with the same name and identical
/// content, Dropbox keeps that file and returns its metadata, even when
/// `autorename` is set. Delete the target first if a new file is required.
pub async fn upload_file(
    client: &DropboxClient,
    local: &Path,
    commit: &CommitInfo,
    progress: Option<ProgressCallback>,
) -> Result<FileMetadata> {
    let mut file = tokio::fs::File::open(local).await?;
    let file_size = file.metadata().await?.len();
    let chunk_size = client.config().chunk_size;
    let mut hasher = ContentHasher::new();

    let metadata = if file_size <= client.config().single_upload_threshold {
        debug!("sending all data at once");
        let data = read_chunk(&mut file, file_size).await?;
        hasher.update(&data);
        let metadata = client.upload(data, commit).await?;
        report(&progress, file_size, file_size, 1, 1);
        metadata
    } else {
        // A session is at least start + finish, even when one chunk holds the file
        let total_chunks = file_size.div_ceil(chunk_size).max(2) as u32;

        debug!("starting file upload");
        let first = read_chunk(&mut file, file_size.min(chunk_size)).await?;
        hasher.update(&first);
        let mut session = UploadSession::start(client, first).await?;
        report(&progress, session.offset(), file_size, 1, total_chunks);

        let mut chunk_number = 1u32;
        loop {
            let remaining = file_size - session.offset();
            chunk_number += 1;

            if remaining <= chunk_size {
                debug!("finishing file upload");
                let last = read_chunk(&mut file, remaining).await?;
                hasher.update(&last);
                let metadata = session.finish(last, commit).await?;
                report(&progress, file_size, file_size, chunk_number, total_chunks);
                break metadata;
            }

            debug!(
                "Uploading chunk {} of {} {:.2}%",
                session.offset(),
                file_size,
                session.offset() as f64 / file_size as f64 * 100.0
            );
            let data = read_chunk(&mut file, chunk_size).await?;
            hasher.update(&data);
            session.append(data).await?;
            report(&progress, session.offset(), file_size, chunk_number, total_chunks);
        }
    };

    let local_hash = hasher.finalize();
    if let Some(remote_hash) = &metadata.content_hash {
        if *remote_hash != local_hash {
            return Err(ClientError::UploadFailed(format!(
                "content hash mismatch for {}: local {}, remote {}",
                commit.path, local_hash, remote_hash
            )));
        }
    }

    let actual = metadata.path_display.as_deref().unwrap_or(&commit.path);
    if commit.autorename && actual.eq_ignore_ascii_case(&commit.path) {
        debug!("server kept the requested name; identical content at the target is not renamed");
    }
    info!("Actual uploaded path is {}", actual);

    Ok(metadata)
}

async fn read_chunk(file: &mut tokio::fs::File, len: u64) -> Result<Bytes> {
    let mut buf = Vec::with_capacity(len as usize);
    file.take(len).read_to_end(&mut buf).await?;
    if (buf.len() as u64) < len {
        return Err(ClientError::UploadFailed(format!(
            "file shrank while uploading: expected {} more bytes, read {}",
            len,
            buf.len()
        )));
    }
    Ok(Bytes::from(buf))
}

fn report(
    progress: &Option<ProgressCallback>,
    bytes_uploaded: u64,
    total_bytes: u64,
    current_chunk: u32,
    total_chunks: u32,
) {
    if let Some(cb) = progress {
        cb(UploadProgress {
            bytes_uploaded,
            total_bytes,
            current_chunk,
            total_chunks,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = UploadProgress {
            bytes_uploaded: 25,
            total_bytes: 100,
            current_chunk: 1,
            total_chunks: 4,
        };
        assert_eq!(progress.percentage(), 25.0);

        let empty = UploadProgress {
            bytes_uploaded: 0,
            total_bytes: 0,
            current_chunk: 1,
            total_chunks: 1,
        };
        assert_eq!(empty.percentage(), 100.0);
    }

    #[tokio::test]
    async fn test_read_chunk_detects_short_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        std::fs::write(&path, b"abc").unwrap();

        let mut file = tokio::fs::File::open(&path).await.unwrap();
        let chunk = read_chunk(&mut file, 2).await.unwrap();
        assert_eq!(&chunk[..], b"ab");

        let err = read_chunk(&mut file, 5).await.unwrap_err();
        assert!(matches!(err, ClientError::UploadFailed(_)));
    }
}
