//! # Matcher Module
//!
//! Looks up stored recipes that duplicate an incoming one.
//!
//! ## Signals
//! | Match type      | Lookup                          | Confidence      |
//! |-----------------|---------------------------------|-----------------|
//! | `exact_image`   | content hash equality           | 1.0             |
//! | `similar_image` | hamming distance <= threshold   | 1 - d/64        |
//! | `same_recipe`   | fingerprint equality            | 0.95            |
//!
//! Exact and fingerprint lookups return at most one recipe (the lowest id).
//! The similar-image scan streams the whole table in bounded batches.

mod finder;
mod strategy;

pub use finder::MatchFinder;
pub use strategy::{SimilarityStrategy, ThresholdStrategy};

use crate::core::hasher::HASH_BITS;
use serde::{Deserialize, Serialize};

/// Which signal produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Byte-identical image file
    ExactImage,
    /// Perceptually similar image
    SimilarImage,
    /// Same normalized name and ingredients
    SameRecipe,
}

impl MatchType {
    /// Wire name, as used in API responses
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::ExactImage => "exact_image",
            MatchType::SimilarImage => "similar_image",
            MatchType::SameRecipe => "same_recipe",
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::ExactImage => write!(f, "Exact Image"),
            MatchType::SimilarImage => write!(f, "Similar Image"),
            MatchType::SameRecipe => write!(f, "Same Recipe"),
        }
    }
}

/// A stored recipe that duplicates the incoming one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub recipe_id: String,
    pub recipe_name: String,
    pub match_type: MatchType,
    /// 0.0 - 1.0
    pub confidence: f64,
    /// Human-readable reason
    pub details: String,
}

impl DuplicateMatch {
    /// Byte-identical image
    pub fn exact_image(
        recipe_id: impl Into<String>,
        recipe_name: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            recipe_name: recipe_name.into(),
            match_type: MatchType::ExactImage,
            confidence,
            details: "Identical image file detected".to_string(),
        }
    }

    /// Perceptually similar image at the given hamming distance
    pub fn similar_image(
        recipe_id: impl Into<String>,
        recipe_name: impl Into<String>,
        distance: u32,
        confidence: f64,
    ) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            recipe_name: recipe_name.into(),
            match_type: MatchType::SimilarImage,
            confidence,
            details: format!("Visually similar image (hamming distance: {})", distance),
        }
    }

    /// Same fingerprint
    pub fn same_recipe(
        recipe_id: impl Into<String>,
        recipe_name: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            recipe_name: recipe_name.into(),
            match_type: MatchType::SameRecipe,
            confidence,
            details: "Same recipe name and ingredients (possibly from different source)"
                .to_string(),
        }
    }
}

/// Confidence assigned to each kind of match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    pub exact_image: f64,
    pub same_recipe: f64,
    /// Width of the perceptual hash; similarity decays linearly to zero over it
    pub hash_bits: u32,
}

impl ConfidencePolicy {
    /// Confidence of a similar-image match at `distance`
    pub fn similar_image(&self, distance: u32) -> f64 {
        if self.hash_bits == 0 {
            return 0.0;
        }
        (1.0 - f64::from(distance) / f64::from(self.hash_bits)).max(0.0)
    }
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            exact_image: 1.0,
            same_recipe: 0.95,
            hash_bits: HASH_BITS,
        }
    }
}
