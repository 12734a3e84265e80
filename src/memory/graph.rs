//! Relationships between stored memories.
//!
//! Links never touch the memory records themselves, so these methods need
//! only `&self`.

use crate::embedding::Embedder;
use crate::errors::Error;
use crate::memory_types::{ConnectedMemory, Metadata, Relationship};

use super::store::MemoryStore;

impl<E: Embedder> MemoryStore<E> {
    #[must_use = "handle the error or the link may silently be missing"]
    /// Create a typed relationship `from_id -> to_id`.
    ///
    /// The kind is trimmed before validation. Returns `true` when the link is
    /// new and `false` when an identical `(from, to, kind)` link already exists.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The ids are equal or the kind is not an identifier (validation)
    /// - Either memory does not exist (`NotFound`)
    /// - The database write fails (`Storage`)
    pub fn add_relationship(
        &self,
        from_id: i64,
        to_id: i64,
        kind: &str,
        properties: Option<&Metadata>,
    ) -> Result<bool, Error> {
        let kind = kind.trim();
        let created = self.db.add_relationship(from_id, to_id, kind, properties)?;

        tracing::debug!(from_id, to_id, kind, created, "added relationship");
        Ok(created)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Relationships touching a memory, in either direction.
    pub fn relationships(&self, memory_id: i64) -> Result<Vec<Relationship>, Error> {
        Ok(self.db.relationships(memory_id)?)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Memories reachable from `memory_id` within `max_depth` relationships.
    ///
    /// Direction is ignored; each memory appears once with its shortest hop
    /// count, nearest first.
    ///
    /// # Errors
    ///
    /// Returns error if `max_depth` is outside `1..=MAX_TRAVERSAL_DEPTH`
    /// (validation) or the starting memory does not exist (`NotFound`).
    pub fn explore_connections(
        &self,
        memory_id: i64,
        max_depth: usize,
    ) -> Result<Vec<ConnectedMemory>, Error> {
        let connected = self.db.connected(memory_id, max_depth)?;
        tracing::debug!(memory_id, max_depth, found = connected.len(), "explored connections");
        Ok(connected)
    }
}
