//! The three duplicate lookups against a signature store.

use super::{ConfidencePolicy, DuplicateMatch, SimilarityStrategy, ThresholdStrategy};
use crate::core::hasher::PerceptualHashValue;
use crate::core::store::{PerceptualCursor, PerceptualEntry, SignatureStore, DEFAULT_BATCH_SIZE};
use crate::error::Result;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default cap on similar-image matches per check
pub const DEFAULT_MAX_SIMILAR_MATCHES: usize = 10;

/// Runs exact, similar and same-recipe lookups against a store
pub struct MatchFinder {
    store: Arc<dyn SignatureStore>,
    strategy: Box<dyn SimilarityStrategy>,
    confidence: ConfidencePolicy,
    max_similar_matches: usize,
    batch_size: usize,
}

impl MatchFinder {
    /// Create a finder with default thresholds
    pub fn new(store: Arc<dyn SignatureStore>) -> Self {
        Self {
            store,
            strategy: Box::new(ThresholdStrategy::default()),
            confidence: ConfidencePolicy::default(),
            max_similar_matches: DEFAULT_MAX_SIMILAR_MATCHES,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the similarity strategy
    pub fn with_strategy(mut self, strategy: Box<dyn SimilarityStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the confidence policy
    pub fn with_confidence(mut self, confidence: ConfidencePolicy) -> Self {
        self.confidence = confidence;
        self
    }

    /// Cap the number of similar-image matches returned
    pub fn max_similar_matches(mut self, max: usize) -> Self {
        self.max_similar_matches = max;
        self
    }

    /// Rows fetched per streaming batch
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Recipe whose image is byte-identical (at most one)
    pub fn exact_image(
        &self,
        content_hash: &str,
        exclude_recipe_id: Option<&str>,
    ) -> Result<Vec<DuplicateMatch>> {
        let found = self.store.first_by_content_hash(content_hash, exclude_recipe_id)?;

        Ok(found
            .map(|sig| {
                debug!(recipe_id = %sig.id, "exact image match");
                DuplicateMatch::exact_image(sig.id, sig.name, self.confidence.exact_image)
            })
            .into_iter()
            .collect())
    }

    /// Recipes whose image is within the similarity threshold, best first.
    ///
    /// Walks every stored perceptual hash in bounded batches. Stored hashes
    /// that fail to parse are skipped with a warning; an unparseable query
    /// hash is an error.
    pub fn similar_images(
        &self,
        perceptual_hash: &str,
        exclude_recipe_id: Option<&str>,
    ) -> Result<Vec<DuplicateMatch>> {
        let query = PerceptualHashValue::from_hex(perceptual_hash)?;
        let mut matches: Vec<DuplicateMatch> = Vec::new();
        let mut scanned = 0usize;

        let cursor = PerceptualCursor::new(self.store.as_ref(), exclude_recipe_id, self.batch_size);
        for batch in cursor {
            let batch = batch?;
            scanned += batch.len();

            let found: Vec<DuplicateMatch> = batch
                .par_iter()
                .filter_map(|entry| self.compare(&query, entry))
                .collect();

            matches.extend(found);
            // Stable: equal confidences keep store (id) order
            matches.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
            matches.truncate(self.max_similar_matches);
        }

        debug!(
            scanned,
            matched = matches.len(),
            threshold = self.strategy.threshold(),
            strategy = %self.strategy.description(),
            "similar image scan complete"
        );
        Ok(matches)
    }

    /// Recipe with the same fingerprint (at most one)
    pub fn same_recipe(
        &self,
        fingerprint: &str,
        exclude_recipe_id: Option<&str>,
    ) -> Result<Vec<DuplicateMatch>> {
        let found = self.store.first_by_fingerprint(fingerprint, exclude_recipe_id)?;

        Ok(found
            .map(|sig| {
                debug!(recipe_id = %sig.id, "same recipe match");
                DuplicateMatch::same_recipe(sig.id, sig.name, self.confidence.same_recipe)
            })
            .into_iter()
            .collect())
    }

    fn compare(&self, query: &PerceptualHashValue, entry: &PerceptualEntry) -> Option<DuplicateMatch> {
        let stored = match PerceptualHashValue::from_hex(&entry.perceptual_hash) {
            Ok(value) => value,
            Err(e) => {
                warn!(recipe_id = %entry.recipe_id, error = %e, "skipping malformed stored perceptual hash");
                return None;
            }
        };

        let distance = query.distance(&stored);
        if !self.strategy.is_similar(distance) {
            return None;
        }

        Some(DuplicateMatch::similar_image(
            entry.recipe_id.clone(),
            entry.recipe_name.clone(),
            distance,
            self.confidence.similar_image(distance),
        ))
    }
}
