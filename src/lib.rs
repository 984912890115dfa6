//! # Recipe Dedup
//!
//! Flags probable duplicate cocktail recipes at upload time.
//!
//! ## Signals
//! - **Exact image** - SHA-256 of the uploaded bytes
//! - **Similar image** - 64-bit perceptual hash within a hamming threshold
//! - **Same recipe** - MD5 fingerprint of normalized name and ingredients
//!
//! Checks are advisory: they report matches with a confidence and never
//! block a save.
//!
//! ## Architecture
//! - `core` - The detection engine
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;

// Re-export commonly used types at the crate root
pub use crate::core::{
    DetectorConfig, DuplicateCheckResult, DuplicateDetector, DuplicateMatch, ImageHashes,
    IngredientLine, MatchType, RecipeHashes,
};
pub use error::{DedupError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
