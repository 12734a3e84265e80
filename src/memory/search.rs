//! Semantic search for the memory store.

use crate::embedding::{validate_embedding, Embedder};
use crate::errors::Error;
use crate::memory_types::ScoredMemory;
use crate::similarity;

use super::store::MemoryStore;

impl<E: Embedder> MemoryStore<E> {
    #[must_use = "handle the error or results may be lost"]
    /// Search memories by semantic similarity.
    ///
    /// Embeds the query, scans every stored memory and ranks them by cosine
    /// similarity. Read-only with respect to the store.
    ///
    /// # Arguments
    ///
    /// * `query` - Search query text (1 to 100,000 bytes)
    /// * `limit` - Maximum number of results; 0 yields no results
    /// * `min_similarity` - Results scoring below this are dropped
    ///
    /// # Returns
    ///
    /// Memories sorted by similarity (highest first, ties by ascending id).
    /// An empty store or an all-filtered result is an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Query is empty or too long, or `min_similarity` is not finite
    /// - Embedding generation fails (`EmbeddingUnavailable`)
    /// - A stored embedding has a different length (`DimensionMismatch`)
    /// - Database reads fail (`Storage`)
    pub fn search_memory(
        &mut self,
        query: &str,
        limit: usize,
        min_similarity: f64,
    ) -> Result<Vec<ScoredMemory>, Error> {
        Self::validate_input_length(query)?;

        if !min_similarity.is_finite() {
            return Err(Error::Validation(format!(
                "min_similarity must be a finite number, got {}",
                min_similarity
            )));
        }

        let embedding = self.embedder.embed(query).inspect_err(|e| {
            tracing::warn!(error = %e, "embedding failed, search aborted");
        })?;
        validate_embedding(&embedding)?;

        if let Some(expected) = self.db.dimensions()? {
            if expected != embedding.len() {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        let candidates = self.db.scan_all()?;
        let scanned = candidates.len();
        let results = similarity::rank(&embedding, candidates, min_similarity, limit)?;

        tracing::debug!(
            scanned,
            returned = results.len(),
            limit,
            min_similarity,
            "searched memories"
        );
        Ok(results)
    }
}
