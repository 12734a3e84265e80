//! Core memory store struct combining an embedder and persistence.

use std::path::Path;
use std::sync::Arc;

use crate::embedding::Embedder;
use crate::errors::Error;
use crate::sqlite::Database;

/// Maximum allowed input length (100,000 bytes).
pub const MAX_INPUT_LENGTH: usize = 100_000;
/// Result count used when a caller does not specify one.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
/// Similarity floor used when a caller does not specify one.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.0;
/// Traversal depth used when a caller does not specify one.
pub const DEFAULT_TRAVERSAL_DEPTH: usize = 2;

/// Memory store combining embedding generation and persistence.
///
/// Owns no global state: the database handle is passed in, and may be shared
/// (via `Arc`) with other stores in the same process.
///
/// # Mutability Requirements
///
/// Methods that generate embeddings (`store_memory`, `search_memory`) require
/// `&mut self` because `Embedder::embed` may mutate provider state.
pub struct MemoryStore<E> {
    pub(crate) db: Arc<Database>,
    pub(crate) embedder: E,
}

impl<E: Embedder> MemoryStore<E> {
    /// Build a store over an already-open database.
    ///
    /// If the embedder declares its output size, the database dimensionality
    /// is pinned to it before any insert.
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` if the database already holds
    /// embeddings of a different size than the embedder declares.
    pub fn new(db: Arc<Database>, embedder: E) -> Result<Self, Error> {
        if let Some(dims) = embedder.dimensions() {
            db.pin_dimensions(dims)?;
        }
        tracing::debug!(dimensions = ?embedder.dimensions(), "memory store ready");
        Ok(MemoryStore { db, embedder })
    }

    /// Open (or create) the SQLite database at `db_path` and build a store on it.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Database path contains path traversal sequences (e.g., "../")
    /// - Parent directory is not accessible
    /// - Database cannot be opened
    /// - Stored dimensionality conflicts with the embedder's
    pub fn open(db_path: &Path, embedder: E) -> Result<Self, Error> {
        use std::path::Component;

        if db_path
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(Error::Config(
                "Invalid database path: contains '..' which may escape the intended directory"
                    .to_string(),
            ));
        }

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::canonicalize(parent).map_err(|e| {
                    Error::Config(format!(
                        "Invalid database path: parent directory not accessible: {}",
                        e
                    ))
                })?;
            }
        }

        let db = Database::open(db_path)?;
        tracing::info!(path = %db_path.display(), "opened memory database");
        Self::new(Arc::new(db), embedder)
    }

    /// Shared handle to the underlying database.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Validate input length (rejects empty and whitespace-only inputs).
    pub(crate) fn validate_input_length(text: &str) -> Result<(), Error> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        if text.len() > MAX_INPUT_LENGTH {
            return Err(Error::InputTooLong {
                max_length: MAX_INPUT_LENGTH,
                actual_length: text.len(),
            });
        }
        Ok(())
    }
}
