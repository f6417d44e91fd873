//! Dropbox content hash
//!
//! The file is split into 4 MiB blocks, each block is hashed with SHA-256,
//! and the hex SHA-256 of the concatenated block digests is the content hash.
//! An empty file hashes to SHA-256 of the empty string.

use sha2::{Digest, Sha256};

/// Block size used by the content hash
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Incremental content hasher, fed in arbitrary slices
pub struct ContentHasher {
    overall: Sha256,
    block: Sha256,
    block_len: usize,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self {
            overall: Sha256::new(),
            block: Sha256::new(),
            block_len: 0,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let take = (BLOCK_SIZE - self.block_len).min(data.len());
            self.block.update(&data[..take]);
            self.block_len += take;
            data = &data[take..];

            if self.block_len == BLOCK_SIZE {
                self.flush_block();
            }
        }
    }

    /// Hex-encoded hash
    pub fn finalize(mut self) -> String {
        if self.block_len > 0 {
            self.flush_block();
        }
        hex::encode(self.overall.finalize())
    }

    fn flush_block(&mut self) {
        let digest = std::mem::replace(&mut self.block, Sha256::new()).finalize();
        self.overall.update(digest);
        self.block_len = 0;
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Content hash of an in-memory buffer
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = ContentHasher::new();
    hasher.update(data);
    hasher.finalize()
}
