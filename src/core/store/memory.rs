//! In-memory signature store for testing.

use super::{PerceptualEntry, RecipeSignature, SignatureStore};
use crate::error::StoreError;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory signature store
///
/// Keeps signatures ordered by id, matching the SQLite backend's
/// "first by id" semantics.
pub struct InMemorySignatureStore {
    entries: RwLock<BTreeMap<String, RecipeSignature>>,
    batches_served: AtomicUsize,
}

impl InMemorySignatureStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            batches_served: AtomicUsize::new(0),
        }
    }

    /// Insert or replace a signature
    pub fn insert(&self, signature: RecipeSignature) -> Result<(), StoreError> {
        self.write()?.insert(signature.id.clone(), signature);
        Ok(())
    }

    /// Remove a signature, returning whether it existed
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.write()?.remove(id).is_some())
    }

    /// Number of stored signatures
    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    /// How many perceptual batches have been fetched so far
    pub fn batches_served(&self) -> usize {
        self.batches_served.load(Ordering::Relaxed)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, RecipeSignature>>, StoreError> {
        self.entries.read().map_err(|_| Self::poisoned())
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, BTreeMap<String, RecipeSignature>>, StoreError> {
        self.entries.write().map_err(|_| Self::poisoned())
    }

    fn poisoned() -> StoreError {
        StoreError::Corrupted {
            path: PathBuf::from("memory"),
        }
    }

    fn first_where(
        &self,
        exclude_recipe_id: Option<&str>,
        predicate: impl Fn(&RecipeSignature) -> bool,
    ) -> Result<Option<RecipeSignature>, StoreError> {
        let entries = self.read()?;

        Ok(entries
            .values()
            .filter(|sig| Some(sig.id.as_str()) != exclude_recipe_id)
            .find(|sig| predicate(sig))
            .cloned())
    }
}

impl Default for InMemorySignatureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureStore for InMemorySignatureStore {
    fn first_by_content_hash(
        &self,
        content_hash: &str,
        exclude_recipe_id: Option<&str>,
    ) -> Result<Option<RecipeSignature>, StoreError> {
        self.first_where(exclude_recipe_id, |sig| {
            sig.image_content_hash.as_deref() == Some(content_hash)
        })
    }

    fn first_by_fingerprint(
        &self,
        fingerprint: &str,
        exclude_recipe_id: Option<&str>,
    ) -> Result<Option<RecipeSignature>, StoreError> {
        self.first_where(exclude_recipe_id, |sig| {
            sig.recipe_fingerprint.as_deref() == Some(fingerprint)
        })
    }

    fn perceptual_batch(
        &self,
        exclude_recipe_id: Option<&str>,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PerceptualEntry>, StoreError> {
        self.batches_served.fetch_add(1, Ordering::Relaxed);

        let entries = self.read()?;

        let lower = match after_id {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };

        Ok(entries
            .range::<str, _>((lower, Bound::Unbounded))
            .map(|(_, sig)| sig)
            .filter(|sig| Some(sig.id.as_str()) != exclude_recipe_id)
            .filter_map(|sig| {
                sig.image_perceptual_hash.as_ref().map(|hash| PerceptualEntry {
                    recipe_id: sig.id.clone(),
                    recipe_name: sig.name.clone(),
                    perceptual_hash: hash.clone(),
                })
            })
            .take(limit)
            .collect())
    }
}
