//! mnemos - A small semantic memory store.
//!
//! Text is embedded into vectors, persisted in SQLite, and recalled by cosine
//! similarity against a query. All operations are synchronous (no async/await
//! required).
//!
//! # Example
//!
//! ```no_run
//! use mnemos::{embedding, Config, MemoryStore};
//!
//! let config = Config::load().expect("Failed to load config");
//! config.ensure_directories().expect("Failed to create directories");
//!
//! let embedder = embedding::from_config(&config).expect("Failed to start embedder");
//! let mut store = MemoryStore::open(&config.database_path, embedder)
//!     .expect("Failed to initialize store");
//!
//! let id = store.store_memory("User prefers TypeScript", None).unwrap();
//! println!("stored {}", id);
//!
//! for hit in store.search_memory("programming language", 5, 0.0).unwrap() {
//!     println!("{:.3}: {}", hit.similarity, hit.memory.text);
//! }
//! ```
//!
//! # Mutability Requirements
//!
//! Methods that generate embeddings (`store_memory`, `search_memory`) require
//! `&mut self` because the embedder may mutate state (ONNX session buffers,
//! HTTP client pools).

pub mod config;
pub mod embedding;
pub mod errors;
pub mod memory;
pub mod memory_types;
pub mod output;
pub mod similarity;
pub mod sqlite;

// Re-export public API
pub use config::Config;
pub use embedding::{Embedder, HttpEmbedder, OnnxEmbedder, EMBEDDING_DIMS};
pub use errors::Error;
pub use memory::MemoryStore;
pub use memory::store::{
    DEFAULT_MIN_SIMILARITY, DEFAULT_SEARCH_LIMIT, DEFAULT_TRAVERSAL_DEPTH, MAX_INPUT_LENGTH,
};
pub use memory_types::{ConnectedMemory, Memory, Metadata, Relationship, ScoredMemory};
pub use similarity::{cosine_similarity, rank};
pub use sqlite::{Database, MAX_TRAVERSAL_DEPTH};
