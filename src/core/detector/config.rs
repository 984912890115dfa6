//! Detector configuration.

use crate::core::cache::DEFAULT_CACHE_CAPACITY;
use crate::core::hasher::HASH_BITS;
use crate::core::matcher::{ConfidencePolicy, ThresholdStrategy};
use crate::core::store::DEFAULT_BATCH_SIZE;
use crate::error::{DedupError, Result};
use serde::{Deserialize, Serialize};

/// Tunables for a [`DuplicateDetector`](super::DuplicateDetector)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Maximum hamming distance reported as similar (inclusive)
    pub similarity_threshold: u32,
    /// Cap on similar-image matches per check
    pub max_similar_matches: usize,
    /// Rows fetched per streaming batch
    pub batch_size: usize,
    /// Perceptual hashes memoized in memory
    pub cache_capacity: usize,
    pub confidence: ConfidencePolicy,
}

impl DetectorConfig {
    /// Start building a configuration from the defaults
    pub fn builder() -> DetectorConfigBuilder {
        DetectorConfigBuilder::default()
    }

    /// Check every value is usable
    pub fn validate(&self) -> Result<()> {
        if self.confidence.hash_bits == 0 || self.confidence.hash_bits > HASH_BITS {
            return Err(DedupError::Config(format!(
                "hash_bits must be between 1 and {}, got {}",
                HASH_BITS, self.confidence.hash_bits
            )));
        }
        if self.similarity_threshold > self.confidence.hash_bits {
            return Err(DedupError::Config(format!(
                "similarity_threshold must be at most {}, got {}",
                self.confidence.hash_bits, self.similarity_threshold
            )));
        }
        if self.batch_size == 0 {
            return Err(DedupError::Config("batch_size must be greater than 0".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(DedupError::Config(
                "cache_capacity must be greater than 0".to_string(),
            ));
        }
        for (field, value) in [
            ("exact_image", self.confidence.exact_image),
            ("same_recipe", self.confidence.same_recipe),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DedupError::Config(format!(
                    "{} confidence must be within 0.0..=1.0, got {}",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: ThresholdStrategy::DEFAULT_THRESHOLD,
            max_similar_matches: 10,
            batch_size: DEFAULT_BATCH_SIZE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            confidence: ConfidencePolicy::default(),
        }
    }
}

/// Builder for [`DetectorConfig`]
#[derive(Debug, Clone, Default)]
pub struct DetectorConfigBuilder {
    config: DetectorConfig,
}

impl DetectorConfigBuilder {
    /// Set the similarity threshold (lower = stricter)
    pub fn similarity_threshold(mut self, threshold: u32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the cap on similar-image matches
    pub fn max_similar_matches(mut self, max: usize) -> Self {
        self.config.max_similar_matches = max;
        self
    }

    /// Set the streaming batch size
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Set the perceptual hash cache capacity
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Set the confidence policy
    pub fn confidence(mut self, confidence: ConfidencePolicy) -> Self {
        self.config.confidence = confidence;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<DetectorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
