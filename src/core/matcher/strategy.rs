//! Strategies for deciding when two perceptual hashes are "similar".

use crate::core::hasher::HASH_BITS;

/// Strategy trait for deciding whether a Hamming distance counts as a match
pub trait SimilarityStrategy: Send + Sync {
    /// Whether two images at this distance should be reported as similar
    fn is_similar(&self, distance: u32) -> bool;

    /// Get the threshold used
    fn threshold(&self) -> u32;

    /// Human-readable description of the strategy
    fn description(&self) -> String;
}

/// Simple threshold-based similarity strategy
#[derive(Debug, Clone)]
pub struct ThresholdStrategy {
    /// Maximum distance to consider similar (inclusive)
    threshold: u32,
}

impl ThresholdStrategy {
    /// Threshold used for recipe photos unless configured otherwise
    pub const DEFAULT_THRESHOLD: u32 = 10;

    /// Create a new threshold strategy, clamped to the hash width.
    ///
    /// Recommended thresholds:
    /// - 5: Conservative, re-encodes of the same photo only
    /// - 10: Default, catches crops and light edits
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.min(HASH_BITS),
        }
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

impl SimilarityStrategy for ThresholdStrategy {
    fn is_similar(&self, distance: u32) -> bool {
        distance <= self.threshold
    }

    fn threshold(&self) -> u32 {
        self.threshold
    }

    fn description(&self) -> String {
        format!(
            "Threshold strategy: images with hamming distance <= {} are similar",
            self.threshold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_strategy_at_boundary() {
        let strategy = ThresholdStrategy::default();

        assert!(strategy.is_similar(0));
        assert!(strategy.is_similar(10));
        assert!(!strategy.is_similar(11));
    }

    #[test]
    fn threshold_is_clamped_to_hash_width() {
        assert_eq!(ThresholdStrategy::new(200).threshold(), HASH_BITS);
    }

    #[test]
    fn description_includes_threshold() {
        assert!(ThresholdStrategy::new(7).description().contains('7'));
    }
}
