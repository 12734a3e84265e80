//! Core memory store orchestrating embedding and SQLite operations.
//!
//! `crud` holds the store path (validate, embed, insert) and plain reads;
//! `search` holds the query path (validate, embed, scan, rank);
//! `graph` links memories and walks those links.

mod crud;
mod graph;
mod search;

// pub(crate): module internals hidden; public items re-exported explicitly via lib.rs
pub(crate) mod store;

pub use store::MemoryStore;
