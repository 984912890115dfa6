//! # Store Module
//!
//! Read-only view of the persisted recipe signatures the detector matches
//! against.
//!
//! The recipe table itself belongs to the application; the detector only
//! needs a projection of it: id, name and the three optional signals
//! written when the recipe was created.
//!
//! ## Streaming
//! Similar-image matching has to look at every stored perceptual hash.
//! [`PerceptualCursor`] walks them in id order in bounded batches (keyset
//! pagination), so memory stays O(batch size) however large the table is.
//! A new cursor restarts the walk.
//!
//! ## Backends
//! - `SqliteSignatureStore` - Persistent storage using SQLite
//! - `InMemorySignatureStore` - For testing

mod memory;
mod sqlite;

pub use memory::InMemorySignatureStore;
pub use sqlite::SqliteSignatureStore;

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default number of rows fetched per streaming batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Duplicate-detection columns of a persisted recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSignature {
    pub id: String,
    pub name: String,
    pub image_content_hash: Option<String>,
    pub image_perceptual_hash: Option<String>,
    pub recipe_fingerprint: Option<String>,
}

impl RecipeSignature {
    /// A signature with no signals yet
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_content_hash: None,
            image_perceptual_hash: None,
            recipe_fingerprint: None,
        }
    }

    /// Set the SHA-256 content hash
    pub fn content_hash(mut self, hash: impl Into<String>) -> Self {
        self.image_content_hash = Some(hash.into());
        self
    }

    /// Set the perceptual hash
    pub fn perceptual_hash(mut self, hash: impl Into<String>) -> Self {
        self.image_perceptual_hash = Some(hash.into());
        self
    }

    /// Set the recipe fingerprint
    pub fn fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.recipe_fingerprint = Some(fingerprint.into());
        self
    }

    /// Generate a new unique recipe ID
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// One row of the perceptual hash stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerceptualEntry {
    pub recipe_id: String,
    pub recipe_name: String,
    pub perceptual_hash: String,
}

/// Read-only lookups the detector needs from the recipe store
pub trait SignatureStore: Send + Sync {
    /// First recipe (by id) whose image has this content hash
    fn first_by_content_hash(
        &self,
        content_hash: &str,
        exclude_recipe_id: Option<&str>,
    ) -> Result<Option<RecipeSignature>, StoreError>;

    /// First recipe (by id) with this fingerprint
    fn first_by_fingerprint(
        &self,
        fingerprint: &str,
        exclude_recipe_id: Option<&str>,
    ) -> Result<Option<RecipeSignature>, StoreError>;

    /// Up to `limit` recipes with a perceptual hash, ordered by id and
    /// strictly after `after_id`
    fn perceptual_batch(
        &self,
        exclude_recipe_id: Option<&str>,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PerceptualEntry>, StoreError>;
}

/// Lazy, finite iterator over perceptual hash batches.
///
/// Fetches the next batch only when asked. Stops after the first short or
/// empty batch, or after an error.
pub struct PerceptualCursor<'a> {
    store: &'a dyn SignatureStore,
    exclude_recipe_id: Option<&'a str>,
    after_id: Option<String>,
    batch_size: usize,
    finished: bool,
}

impl<'a> PerceptualCursor<'a> {
    /// Start a fresh walk over the store
    pub fn new(
        store: &'a dyn SignatureStore,
        exclude_recipe_id: Option<&'a str>,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            exclude_recipe_id,
            after_id: None,
            batch_size: batch_size.max(1),
            finished: false,
        }
    }
}

impl Iterator for PerceptualCursor<'_> {
    type Item = Result<Vec<PerceptualEntry>, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let batch = match self.store.perceptual_batch(
            self.exclude_recipe_id,
            self.after_id.as_deref(),
            self.batch_size,
        ) {
            Ok(batch) => batch,
            Err(e) => {
                self.finished = true;
                return Some(Err(e));
            }
        };

        if batch.len() < self.batch_size {
            self.finished = true;
        }
        match batch.last() {
            Some(last) => self.after_id = Some(last.recipe_id.clone()),
            None => return None,
        }

        Some(Ok(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(count: usize) -> InMemorySignatureStore {
        let store = InMemorySignatureStore::new();
        for i in 0..count {
            store
                .insert(
                    RecipeSignature::new(format!("r{:03}", i), format!("Recipe {}", i))
                        .perceptual_hash(format!("{:016x}", i)),
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn cursor_yields_bounded_batches_in_id_order() {
        let store = store_with(7);
        let batches: Vec<Vec<PerceptualEntry>> = PerceptualCursor::new(&store, None, 3)
            .collect::<Result<_, _>>()
            .unwrap();

        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);

        let ids: Vec<&str> = batches.iter().flatten().map(|e| e.recipe_id.as_str()).collect();
        assert_eq!(ids, vec!["r000", "r001", "r002", "r003", "r004", "r005", "r006"]);
    }

    #[test]
    fn cursor_on_empty_store_yields_nothing() {
        let store = InMemorySignatureStore::new();
        assert_eq!(PerceptualCursor::new(&store, None, 10).count(), 0);
    }

    #[test]
    fn cursor_is_lazy() {
        let store = store_with(10);
        let mut cursor = PerceptualCursor::new(&store, None, 2);

        assert_eq!(store.batches_served(), 0);
        cursor.next();
        assert_eq!(store.batches_served(), 1);
    }

    #[test]
    fn exact_multiple_ends_with_one_empty_fetch() {
        let store = store_with(4);
        let batches = PerceptualCursor::new(&store, None, 2).count();

        assert_eq!(batches, 2);
        assert_eq!(store.batches_served(), 3);
    }

    #[test]
    fn cursor_skips_excluded_recipe() {
        let store = store_with(3);
        let ids: Vec<String> = PerceptualCursor::new(&store, Some("r001"), 10)
            .flat_map(|batch| batch.unwrap())
            .map(|e| e.recipe_id)
            .collect();

        assert_eq!(ids, vec!["r000".to_string(), "r002".to_string()]);
    }

    #[test]
    fn new_cursor_restarts_from_the_beginning() {
        let store = store_with(3);
        let first: usize = PerceptualCursor::new(&store, None, 2).map(|b| b.unwrap().len()).sum();
        let second: usize = PerceptualCursor::new(&store, None, 2).map(|b| b.unwrap().len()).sum();

        assert_eq!(first, 3);
        assert_eq!(second, 3);
    }

    #[test]
    fn signature_builder_sets_fields() {
        let sig = RecipeSignature::new("id-1", "Margarita")
            .content_hash("abc")
            .perceptual_hash("0011223344556677")
            .fingerprint("f00");

        assert_eq!(sig.image_content_hash.as_deref(), Some("abc"));
        assert_eq!(sig.image_perceptual_hash.as_deref(), Some("0011223344556677"));
        assert_eq!(sig.recipe_fingerprint.as_deref(), Some("f00"));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(RecipeSignature::generate_id(), RecipeSignature::generate_id());
    }
}
