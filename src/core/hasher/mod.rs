//! # Hasher Module
//!
//! Computes the two image signals used for duplicate detection.
//!
//! ## Hashes
//! - **Content hash (SHA-256)** - Exact byte match; any change yields an
//!   unrelated digest
//! - **Perceptual hash (pHash)** - DCT-based, survives re-encoding and resizing
//!
//! Both are computed once per upload and carried around as [`ImageHashes`]
//! so later call sites can pass them back in instead of recomputing.
//!
//! ## Performance Optimizations
//! - Uses `zune-jpeg` for 1.5-2x faster JPEG decoding
//! - Memoizes perceptual hashes by content hash (see `core::cache`)
//!
//! ## Example
//! ```rust,ignore
//! use recipe_dedup::core::hasher::{ImageHashes, PerceptualHasher};
//!
//! let hasher = PerceptualHasher::new();
//! let hashes = ImageHashes::from_image_data(&bytes, &hasher)?;
//! println!("{} / {}", hashes.content_hash, hashes.perceptual_hash);
//! ```

mod content;
pub mod fast_decode;
mod perceptual;
mod value;

pub use content::{ContentHasher, CONTENT_HASH_HEX_LEN};
pub use perceptual::PerceptualHasher;
pub use value::{PerceptualHashValue, HASH_BITS, HASH_HEX_LEN};

use crate::error::HashError;
use serde::{Deserialize, Serialize};

/// Both hashes of one image blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHashes {
    /// 64-character SHA-256 hex digest
    pub content_hash: String,
    /// 16-character pHash hex
    pub perceptual_hash: String,
}

impl ImageHashes {
    /// Compute both hashes with a single decode of the image
    pub fn from_image_data(bytes: &[u8], hasher: &PerceptualHasher) -> Result<Self, HashError> {
        let content_hash = ContentHasher::new().hash(bytes);
        let perceptual_hash = hasher.hash_with_content_hash(bytes, &content_hash)?;

        Ok(Self {
            content_hash,
            perceptual_hash,
        })
    }

    /// Parse the perceptual hash for distance comparisons
    pub fn perceptual_value(&self) -> Result<PerceptualHashValue, HashError> {
        PerceptualHashValue::from_hex(&self.perceptual_hash)
    }
}
