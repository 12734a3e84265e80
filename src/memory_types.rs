//! Memory record and search result types.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Free-form metadata attached to a memory (tags, category, importance, ...).
///
/// Keys are kept sorted, so serialization round-trips deterministically.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single stored memory.
///
/// Records are immutable once inserted; the store never updates or deletes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Memory {
    /// Store-assigned identifier, strictly increasing in insertion order.
    pub id: i64,
    /// Literal memory content (never empty).
    pub text: String,
    /// Embedding vector; same length for every record in a store.
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub metadata: Option<Metadata>,
    pub created_at: DateTime<Utc>,
}

/// A memory paired with its cosine similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMemory {
    pub memory: Memory,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub similarity: f64,
}

/// A typed, directed link between two memories (e.g. `RELATES_TO`).
///
/// Like memories, relationships are append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    pub id: i64,
    pub from_id: i64,
    pub to_id: i64,
    pub kind: String,
    pub properties: Option<Metadata>,
    pub created_at: DateTime<Utc>,
}

/// A memory reached by walking relationships (in either direction).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectedMemory {
    pub memory: Memory,
    /// Fewest relationships between the starting memory and this one.
    pub hops: usize,
}
