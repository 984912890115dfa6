//! SHA-256 content hashing for exact duplicate detection.

use sha2::{Digest, Sha256};

/// Length of a content hash rendered as hex
pub const CONTENT_HASH_HEX_LEN: usize = 64;

/// Computes exact-byte digests of uploaded images.
///
/// Deliberately does not look at the bytes as an image: any input,
/// valid or not, has a content hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentHasher;

impl ContentHasher {
    /// Create a new content hasher
    pub fn new() -> Self {
        Self
    }

    /// Lowercase hex SHA-256 of the raw bytes
    pub fn hash(&self, bytes: &[u8]) -> String {
        format!("{:x}", Sha256::digest(bytes))
    }
}
