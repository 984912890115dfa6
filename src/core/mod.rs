//! # Core Module
//!
//! The duplicate detection engine, independent of any web framework or CLI.
//!
//! ## Modules
//! - `hasher` - Content (SHA-256) and perceptual (pHash) image hashes
//! - `cache` - Bounded memoization of perceptual hashes
//! - `fingerprint` - Order-independent recipe fingerprints
//! - `store` - Read-only access to persisted recipe signatures
//! - `matcher` - Exact, similar and same-recipe lookups
//! - `aggregator` - Merges lookups into one verdict
//! - `detector` - Public entry point tying it all together

pub mod aggregator;
pub mod cache;
pub mod detector;
pub mod fingerprint;
pub mod hasher;
pub mod matcher;
pub mod store;

// Re-export commonly used types
pub use aggregator::DuplicateCheckResult;
pub use detector::{DetectorConfig, DuplicateDetector, RecipeHashes};
pub use fingerprint::IngredientLine;
pub use hasher::ImageHashes;
pub use matcher::{DuplicateMatch, MatchType};
