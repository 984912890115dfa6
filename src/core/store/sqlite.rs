//! SQLite signature store for persistent storage.

use super::{PerceptualEntry, RecipeSignature, SignatureStore};
use crate::error::StoreError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SIGNATURE_COLUMNS: &str =
    "id, name, image_content_hash, image_perceptual_hash, recipe_fingerprint";

/// SQLite-backed signature store
///
/// Uses WAL (Write-Ahead Logging) mode so duplicate checks can read while
/// the application is inserting new recipes. Each signal column is indexed,
/// so the two equality lookups never scan the table.
pub struct SqliteSignatureStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteSignatureStore {
    /// Open or create a signature database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Self::init(conn, path.to_path_buf())
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::OpenFailed {
            path: PathBuf::from(":memory:"),
            reason: e.to_string(),
        })?;
        Self::init(conn, PathBuf::from(":memory:"))
    }

    fn init(conn: Connection, db_path: PathBuf) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS recipe_signatures (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                image_content_hash TEXT,
                image_perceptual_hash TEXT,
                recipe_fingerprint TEXT
            );
            CREATE INDEX IF NOT EXISTS ix_recipe_signatures_content_hash
                ON recipe_signatures(image_content_hash);
            CREATE INDEX IF NOT EXISTS ix_recipe_signatures_perceptual_hash
                ON recipe_signatures(image_perceptual_hash);
            CREATE INDEX IF NOT EXISTS ix_recipe_signatures_fingerprint
                ON recipe_signatures(recipe_fingerprint);",
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Corrupted {
            path: self.db_path.clone(),
        })
    }

    fn row_to_signature(row: &Row<'_>) -> rusqlite::Result<RecipeSignature> {
        Ok(RecipeSignature {
            id: row.get(0)?,
            name: row.get(1)?,
            image_content_hash: row.get(2)?,
            image_perceptual_hash: row.get(3)?,
            recipe_fingerprint: row.get(4)?,
        })
    }

    /// Store a signature, replacing any existing row with the same id.
    ///
    /// This is the application's write path at recipe creation time; the
    /// detector itself only reads.
    pub fn upsert(&self, signature: &RecipeSignature) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO recipe_signatures
             (id, name, image_content_hash, image_perceptual_hash, recipe_fingerprint)
             VALUES (?, ?, ?, ?, ?)",
            params![
                signature.id,
                signature.name,
                signature.image_content_hash,
                signature.image_perceptual_hash,
                signature.recipe_fingerprint,
            ],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Get a signature by id
    pub fn get(&self, id: &str) -> Result<Option<RecipeSignature>, StoreError> {
        let conn = self.lock()?;

        conn.query_row(
            &format!("SELECT {SIGNATURE_COLUMNS} FROM recipe_signatures WHERE id = ?"),
            [id],
            Self::row_to_signature,
        )
        .optional()
        .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }

    /// Delete a signature, returning whether it existed
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;

        let rows_affected = conn
            .execute("DELETE FROM recipe_signatures WHERE id = ?", [id])
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(rows_affected > 0)
    }

    /// Number of stored signatures
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;

        conn.query_row("SELECT COUNT(*) FROM recipe_signatures", [], |row| {
            row.get::<_, i64>(0).map(|v| v as usize)
        })
        .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }

    fn first_where(
        &self,
        column: &str,
        value: &str,
        exclude_recipe_id: Option<&str>,
    ) -> Result<Option<RecipeSignature>, StoreError> {
        let conn = self.lock()?;

        conn.query_row(
            &format!(
                "SELECT {SIGNATURE_COLUMNS} FROM recipe_signatures
                 WHERE {column} = ?1 AND (?2 IS NULL OR id != ?2)
                 ORDER BY id LIMIT 1"
            ),
            params![value, exclude_recipe_id],
            Self::row_to_signature,
        )
        .optional()
        .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }
}

impl SignatureStore for SqliteSignatureStore {
    fn first_by_content_hash(
        &self,
        content_hash: &str,
        exclude_recipe_id: Option<&str>,
    ) -> Result<Option<RecipeSignature>, StoreError> {
        self.first_where("image_content_hash", content_hash, exclude_recipe_id)
    }

    fn first_by_fingerprint(
        &self,
        fingerprint: &str,
        exclude_recipe_id: Option<&str>,
    ) -> Result<Option<RecipeSignature>, StoreError> {
        self.first_where("recipe_fingerprint", fingerprint, exclude_recipe_id)
    }

    fn perceptual_batch(
        &self,
        exclude_recipe_id: Option<&str>,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PerceptualEntry>, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare_cached(
                "SELECT id, name, image_perceptual_hash FROM recipe_signatures
                 WHERE image_perceptual_hash IS NOT NULL
                   AND (?1 IS NULL OR id != ?1)
                   AND (?2 IS NULL OR id > ?2)
                 ORDER BY id
                 LIMIT ?3",
            )
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![exclude_recipe_id, after_id, limit as i64],
                |row| {
                    Ok(PerceptualEntry {
                        recipe_id: row.get(0)?,
                        recipe_name: row.get(1)?,
                        perceptual_hash: row.get(2)?,
                    })
                },
            )
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let entries: rusqlite::Result<Vec<_>> = rows.collect();
        entries.map_err(|e| StoreError::QueryFailed(e.to_string()))
    }
}
