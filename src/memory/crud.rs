//! Store and read operations for the memory store.

use crate::embedding::{validate_embedding, Embedder};
use crate::errors::Error;
use crate::memory_types::{Memory, Metadata};

use super::store::MemoryStore;

impl<E: Embedder> MemoryStore<E> {
    #[must_use = "handle the error or the memory id may be lost"]
    /// Validate, embed and persist a new memory.
    ///
    /// Nothing is written unless embedding succeeds, and a failed insert
    /// leaves the store unchanged.
    ///
    /// # Arguments
    ///
    /// * `text` - Memory content (1 to 100,000 bytes, not whitespace-only)
    /// * `metadata` - Optional JSON object stored alongside the text
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Text is empty or too long (validation)
    /// - The embedder fails or returns a malformed vector (`EmbeddingUnavailable`)
    /// - The embedding length differs from the store's (`DimensionMismatch`)
    /// - The database write fails (`Storage`)
    pub fn store_memory(&mut self, text: &str, metadata: Option<&Metadata>) -> Result<i64, Error> {
        Self::validate_input_length(text)?;

        let embedding = self.embedder.embed(text).inspect_err(|e| {
            tracing::warn!(error = %e, "embedding failed, memory not stored");
        })?;
        validate_embedding(&embedding)?;

        let id = self
            .db
            .insert(text, &embedding, metadata)
            .map_err(Error::from)
            .inspect_err(|e| {
                if matches!(e, Error::DimensionMismatch { .. }) {
                    tracing::warn!(error = %e, "rejected embedding with foreign dimensionality");
                }
            })?;

        tracing::debug!(id, dimensions = embedding.len(), "stored memory");
        Ok(id)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Get a specific memory by id.
    ///
    /// Returns `None` if the memory doesn't exist.
    pub fn get(&self, id: i64) -> Result<Option<Memory>, Error> {
        Ok(self.db.get(id)?)
    }

    #[must_use = "handle the error or results may be lost"]
    /// List the most recent memories, newest first.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `limit` is 0 or exceeds 10,000.
    pub fn list(&self, limit: usize) -> Result<Vec<Memory>, Error> {
        Ok(self.db.list(limit)?)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Number of stored memories.
    pub fn count(&self) -> Result<usize, Error> {
        Ok(self.db.count()?)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Dimensionality shared by every stored embedding, once established.
    pub fn dimensions(&self) -> Result<Option<usize>, Error> {
        Ok(self.db.dimensions()?)
    }
}
