//! Perceptual Hash (pHash) with memoization.
//!
//! pHash uses the Discrete Cosine Transform (DCT) to extract the low
//! frequency structure of the image, which survives:
//! - Re-compression (JPEG quality changes)
//! - Resizing
//! - Minor brightness/contrast changes
//!
//! ## Algorithm
//! 1. Convert to 8-bit luma (ITU-R 601-2 weights)
//! 2. Resize to 32x32 with a Lanczos3 filter
//! 3. Take the 2D DCT-II and keep the top-left 8x8 block, DC included
//! 4. Set a bit for every coefficient strictly greater than the block median,
//!    row by row, first coefficient in the most significant bit
//!
//! A perfectly flat thumbnail has no AC energy, so step 4 cannot tell two
//! solid colours apart. Those images are hashed by brightness instead: the
//! low `round(mean * 64 / 255)` bits are set, which keeps the Hamming
//! distance between two flat images proportional to their brightness gap.
//!
//! Results are memoized in a [`HashCache`] keyed by the content hash of the
//! input bytes, so the pre-upload check and the post-extraction store of
//! the same photo only decode it once.

use super::content::ContentHasher;
use super::fast_decode::FastDecoder;
use super::value::{PerceptualHashValue, HASH_BITS};
use crate::core::cache::{CacheStats, HashCache, LruHashCache};
use crate::error::HashError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use std::f64::consts::PI;
use std::sync::Arc;
use tracing::debug;

/// Side length of the thumbnail the DCT runs over
const DCT_INPUT_SIZE: usize = 32;

/// Side length of the low-frequency block the hash is taken from
const DCT_BLOCK_SIZE: usize = 8;

/// Perceptual Hash (pHash) implementation using DCT
pub struct PerceptualHasher {
    /// `cos(PI * (2n + 1) * k / 64)` for the low frequencies `k`
    cosines: [[f64; DCT_INPUT_SIZE]; DCT_BLOCK_SIZE],
    /// Memoized results keyed by content hash
    cache: Arc<dyn HashCache>,
    content: ContentHasher,
}

impl PerceptualHasher {
    /// Create a pHash hasher with the default bounded LRU cache
    pub fn new() -> Self {
        Self::with_cache(Arc::new(LruHashCache::default()))
    }

    /// Create a pHash hasher backed by the given cache
    pub fn with_cache(cache: Arc<dyn HashCache>) -> Self {
        let mut cosines = [[0.0; DCT_INPUT_SIZE]; DCT_BLOCK_SIZE];
        for (k, row) in cosines.iter_mut().enumerate() {
            for (n, value) in row.iter_mut().enumerate() {
                *value = (PI * (2 * n + 1) as f64 * k as f64 / (2 * DCT_INPUT_SIZE) as f64).cos();
            }
        }

        Self {
            cosines,
            cache,
            content: ContentHasher::new(),
        }
    }

    /// Hash raw image bytes, returning the 16-character hex form.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be decoded as an image.
    pub fn hash(&self, bytes: &[u8]) -> Result<String, HashError> {
        let content_hash = self.content.hash(bytes);
        self.hash_with_content_hash(bytes, &content_hash)
    }

    /// Hash raw image bytes whose content hash is already known.
    ///
    /// `content_hash` must be the SHA-256 of `bytes`; it is only used as
    /// the cache key.
    pub fn hash_with_content_hash(
        &self,
        bytes: &[u8],
        content_hash: &str,
    ) -> Result<String, HashError> {
        if let Some(cached) = self.cache.get(content_hash) {
            debug!(content_hash, "perceptual hash cache hit");
            return Ok(cached);
        }

        let image = FastDecoder::decode(bytes)?;
        let hex = self.hash_image(&image)?.to_hex();

        debug!(content_hash, perceptual_hash = %hex, "computed perceptual hash");
        self.cache.insert(content_hash.to_string(), hex.clone());
        Ok(hex)
    }

    /// Compute the hash of an already-decoded image (never cached)
    pub fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualHashValue, HashError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(HashError::EmptyImage);
        }

        let thumbnail = imageops::resize(
            &luma_601(image),
            DCT_INPUT_SIZE as u32,
            DCT_INPUT_SIZE as u32,
            FilterType::Lanczos3,
        );
        let pixels: Vec<f64> = thumbnail.pixels().map(|p| f64::from(p.0[0])).collect();

        if let Some(bits) = flat_brightness_bits(&pixels) {
            return Ok(PerceptualHashValue::from_bits(bits));
        }

        let coefficients = self.low_frequencies(&pixels);
        let threshold = median(&coefficients);

        let bits = coefficients
            .iter()
            .fold(0u64, |bits, &c| (bits << 1) | u64::from(c > threshold));
        Ok(PerceptualHashValue::from_bits(bits))
    }

    /// Separable DCT-II restricted to the top-left block, row-major with
    /// the vertical frequency as the row
    fn low_frequencies(&self, pixels: &[f64]) -> Vec<f64> {
        // Horizontal pass: one row of low frequencies per thumbnail row
        let mut rows = [[0.0f64; DCT_BLOCK_SIZE]; DCT_INPUT_SIZE];
        for (y, row) in rows.iter_mut().enumerate() {
            let line = &pixels[y * DCT_INPUT_SIZE..(y + 1) * DCT_INPUT_SIZE];
            for (u, out) in row.iter_mut().enumerate() {
                *out = line.iter().zip(&self.cosines[u]).map(|(p, c)| p * c).sum();
            }
        }

        let mut block = Vec::with_capacity(DCT_BLOCK_SIZE * DCT_BLOCK_SIZE);
        for v in 0..DCT_BLOCK_SIZE {
            for u in 0..DCT_BLOCK_SIZE {
                let sum: f64 = rows
                    .iter()
                    .zip(&self.cosines[v])
                    .map(|(row, c)| row[u] * c)
                    .sum();
                block.push(sum);
            }
        }
        block
    }

    /// Drop every memoized hash
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Statistics of the backing cache
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// 8-bit luma using the ITU-R 601-2 weights in 16.16 fixed point
fn luma_601(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let l = (u32::from(r) * 19_595 + u32::from(g) * 38_470 + u32::from(b) * 7_471 + 0x8000)
            >> 16;
        Luma([l.min(255) as u8])
    })
}

/// Brightness code for a thumbnail with a single gray level, `None` otherwise
fn flat_brightness_bits(pixels: &[f64]) -> Option<u64> {
    let first = *pixels.first()?;
    if pixels.iter().any(|&p| p != first) {
        return None;
    }

    let count = (first * f64::from(HASH_BITS) / 255.0).round() as u32;
    Some(match count {
        0 => 0,
        c if c >= HASH_BITS => u64::MAX,
        c => (1u64 << c) - 1,
    })
}

/// Median of an even-length block: the mean of the two middle values
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
