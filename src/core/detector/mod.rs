//! # Detector Module
//!
//! The public entry point: hash an upload, fingerprint a recipe, and check
//! both against the stored recipes.
//!
//! ## Flow
//! 1. Hash the image (or reuse hashes the caller already computed)
//! 2. Run the exact, similar and (when name and ingredients are given)
//!    same-recipe lookups
//! 3. Merge into one [`DuplicateCheckResult`]
//!
//! The check is advisory. It never writes to the store and never blocks the
//! caller from saving the recipe.
//!
//! ## Example
//! ```rust,ignore
//! use recipe_dedup::core::detector::DuplicateDetector;
//! use recipe_dedup::core::store::SqliteSignatureStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteSignatureStore::open(&db_path)?);
//! let detector = DuplicateDetector::new(store);
//! let result = detector.check_for_duplicates(&bytes, Some("Margarita"), Some(&ingredients), None, None)?;
//! if let Some(best) = result.best_match() {
//!     println!("{} ({:.0}%)", best.recipe_name, best.confidence * 100.0);
//! }
//! ```

mod config;

pub use config::{DetectorConfig, DetectorConfigBuilder};

use crate::core::aggregator::{DuplicateCheckResult, ScoreAggregator};
use crate::core::cache::{CacheStats, HashCache, LruHashCache};
use crate::core::fingerprint::{FingerprintBuilder, IngredientLine};
use crate::core::hasher::{ImageHashes, PerceptualHasher};
use crate::core::matcher::{MatchFinder, ThresholdStrategy};
use crate::core::store::SignatureStore;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// The three dedup columns written onto a recipe at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeHashes {
    pub content_hash: String,
    pub perceptual_hash: String,
    pub recipe_fingerprint: String,
}

/// Builder for a [`DuplicateDetector`]
pub struct DuplicateDetectorBuilder {
    store: Arc<dyn SignatureStore>,
    config: DetectorConfig,
    cache: Option<Arc<dyn HashCache>>,
}

impl DuplicateDetectorBuilder {
    /// Use the given configuration
    pub fn config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the similarity threshold
    pub fn similarity_threshold(mut self, threshold: u32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Use a custom perceptual hash cache instead of an in-memory LRU
    pub fn cache(mut self, cache: Arc<dyn HashCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Validate the configuration and build the detector
    pub fn build(self) -> Result<DuplicateDetector> {
        self.config.validate()?;

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(LruHashCache::new(self.config.cache_capacity)));

        let finder = MatchFinder::new(self.store)
            .with_strategy(Box::new(ThresholdStrategy::new(self.config.similarity_threshold)))
            .with_confidence(self.config.confidence)
            .max_similar_matches(self.config.max_similar_matches)
            .batch_size(self.config.batch_size);

        Ok(DuplicateDetector {
            hasher: PerceptualHasher::with_cache(cache),
            fingerprints: FingerprintBuilder::new(),
            finder,
            aggregator: ScoreAggregator::new(),
            config: self.config,
        })
    }
}

/// Recipe duplicate detector
///
/// Shareable across threads; concurrent checks only share the hash cache.
pub struct DuplicateDetector {
    config: DetectorConfig,
    hasher: PerceptualHasher,
    fingerprints: FingerprintBuilder,
    finder: MatchFinder,
    aggregator: ScoreAggregator,
}

impl DuplicateDetector {
    /// Create a detector with the default configuration
    pub fn new(store: Arc<dyn SignatureStore>) -> Self {
        let config = DetectorConfig::default();
        let finder = MatchFinder::new(store);

        Self {
            hasher: PerceptualHasher::with_cache(Arc::new(LruHashCache::new(config.cache_capacity))),
            fingerprints: FingerprintBuilder::new(),
            finder,
            aggregator: ScoreAggregator::new(),
            config,
        }
    }

    /// Start building a detector over the given store
    pub fn builder(store: Arc<dyn SignatureStore>) -> DuplicateDetectorBuilder {
        DuplicateDetectorBuilder {
            store,
            config: DetectorConfig::default(),
            cache: None,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Content and perceptual hash of an image.
    ///
    /// # Errors
    ///
    /// Fails if the bytes cannot be decoded as an image.
    pub fn compute_hashes(&self, image_bytes: &[u8]) -> Result<ImageHashes> {
        Ok(ImageHashes::from_image_data(image_bytes, &self.hasher)?)
    }

    /// Order-independent fingerprint of a recipe's name and ingredients
    pub fn compute_fingerprint(&self, name: &str, ingredients: &[IngredientLine]) -> String {
        self.fingerprints.fingerprint(name, ingredients)
    }

    /// All three dedup values for a new recipe, reusing `precomputed` image
    /// hashes when the caller already has them.
    pub fn compute_recipe_hashes(
        &self,
        image_bytes: &[u8],
        name: &str,
        ingredients: &[IngredientLine],
        precomputed: Option<&ImageHashes>,
    ) -> Result<RecipeHashes> {
        let image_hashes = match precomputed {
            Some(hashes) => hashes.clone(),
            None => self.compute_hashes(image_bytes)?,
        };

        Ok(RecipeHashes {
            content_hash: image_hashes.content_hash,
            perceptual_hash: image_hashes.perceptual_hash,
            recipe_fingerprint: self.compute_fingerprint(name, ingredients),
        })
    }

    /// Check an upload against every stored recipe.
    ///
    /// `exclude_recipe_id` hides one recipe from all lookups (the recipe
    /// being edited). The same-recipe lookup only runs when both a
    /// non-blank name and at least one ingredient are given. When
    /// `precomputed_hashes` is supplied the image bytes are not decoded.
    pub fn check_for_duplicates(
        &self,
        image_bytes: &[u8],
        recipe_name: Option<&str>,
        ingredients: Option<&[IngredientLine]>,
        exclude_recipe_id: Option<&str>,
        precomputed_hashes: Option<&ImageHashes>,
    ) -> Result<DuplicateCheckResult> {
        let started = Instant::now();

        let hashes = match precomputed_hashes {
            Some(hashes) => hashes.clone(),
            None => self.compute_hashes(image_bytes)?,
        };
        debug!(
            content_hash = %hashes.content_hash,
            perceptual_hash = %hashes.perceptual_hash,
            "checking for duplicates"
        );

        let exact = self.finder.exact_image(&hashes.content_hash, exclude_recipe_id)?;
        let similar = self.finder.similar_images(&hashes.perceptual_hash, exclude_recipe_id)?;

        let same_recipe = match (recipe_name, ingredients) {
            (Some(name), Some(ingredients)) if !name.trim().is_empty() && !ingredients.is_empty() => {
                let fingerprint = self.compute_fingerprint(name, ingredients);
                self.finder.same_recipe(&fingerprint, exclude_recipe_id)?
            }
            _ => Vec::new(),
        };

        let result = self.aggregator.merge([exact, similar, same_recipe]);

        info!(
            is_duplicate = result.is_duplicate,
            matches = result.matches.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "duplicate check complete"
        );
        Ok(result)
    }

    /// Drop every memoized perceptual hash
    pub fn clear_hash_cache(&self) {
        self.hasher.clear_cache();
    }

    /// Perceptual hash cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.hasher.cache_stats()
    }
}
