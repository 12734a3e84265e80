//! SQLite backend for mnemos memory storage.
//!
//! This module provides:
//! - `Database`: connection, schema and append-only inserts
//! - `embedding`: BLOB conversion for embedding vectors
//! - `scan`: read operations (full scan, lookup, listing)
//! - `relations`: typed links between memories and traversal over them
//!
//! The connection sits behind a mutex: every insert runs check-dimensions,
//! insert and (on the first record) dimension bookkeeping in one immediate
//! transaction, so id assignment and dimensionality are never raced.

pub mod embedding;
pub mod relations;
pub mod scan;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::memory_types::Metadata;

pub use self::embedding::{blob_to_vec, vec_to_blob};
pub use self::relations::{validate_kind, MAX_TRAVERSAL_DEPTH};
pub use self::scan::validate_limit;

const DIMENSIONS_KEY: &str = "dimensions";

/// Error types for SQLite operations.
#[derive(Debug)]
pub enum Error {
    Sqlite(String),
    InvalidBlobSize { actual: usize },
    MismatchedDimensions { expected: usize, actual: usize },
    EmptyEmbedding,
    Corrupted(String),
    InvalidLimit(String),
    InvalidRelationship(String),
    MemoryNotFound(i64),
    LockPoisoned,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Sqlite(msg) => write!(f, "Database error: {}", msg),
            Error::InvalidBlobSize { actual } => write!(
                f,
                "Invalid BLOB size: {} bytes is not a non-empty sequence of f32 values",
                actual
            ),
            Error::MismatchedDimensions { expected, actual } => write!(
                f,
                "Mismatched dimensions: expected {} dimensions, got {} dimensions",
                expected, actual
            ),
            Error::EmptyEmbedding => write!(f, "Cannot store an empty embedding"),
            Error::Corrupted(msg) => write!(f, "Corrupted record: {}", msg),
            Error::InvalidLimit(msg) => write!(f, "Invalid limit: {}", msg),
            Error::InvalidRelationship(msg) => write!(f, "Invalid relationship: {}", msg),
            Error::MemoryNotFound(id) => write!(f, "Memory not found: {}", id),
            Error::LockPoisoned => write!(f, "Database lock poisoned"),
        }
    }
}

impl std::error::Error for Error {}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Sqlite(err.to_string())
    }
}

impl From<Error> for crate::errors::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::MismatchedDimensions { expected, actual } => {
                crate::errors::Error::DimensionMismatch { expected, actual }
            }
            Error::EmptyEmbedding | Error::InvalidLimit(_) | Error::InvalidRelationship(_) => {
                crate::errors::Error::Validation(err.to_string())
            }
            Error::MemoryNotFound(id) => crate::errors::Error::NotFound(id),
            other => crate::errors::Error::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// SQLite database backend for mnemos.
pub struct Database {
    conn: Mutex<Connection>,
}

/// Initialize database schema.
fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS memories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            metadata TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS relationships (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            from_id INTEGER NOT NULL REFERENCES memories(id),
            to_id INTEGER NOT NULL REFERENCES memories(id),
            kind TEXT NOT NULL,
            properties TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (from_id, to_id, kind)
        );

        CREATE INDEX IF NOT EXISTS idx_relationships_to ON relationships(to_id);

        CREATE TABLE IF NOT EXISTS store_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Read the established dimensionality, if any record has fixed it yet.
fn read_dimensions(conn: &Connection) -> Result<Option<usize>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = ?1",
            [DIMENSIONS_KEY],
            |row| row.get(0),
        )
        .optional()?;

    value
        .map(|v| {
            v.parse::<usize>()
                .map_err(|e| Error::Corrupted(format!("invalid stored dimensions {:?}: {}", v, e)))
        })
        .transpose()
}

fn write_dimensions(conn: &Connection, dims: usize) -> Result<()> {
    conn.execute(
        "INSERT INTO store_meta (key, value) VALUES (?1, ?2)",
        params![DIMENSIONS_KEY, dims.to_string()],
    )?;
    Ok(())
}

impl Database {
    /// Open or create a SQLite database at the given path.
    ///
    /// Initializes the schema if the database is new. Reopening an existing
    /// database keeps its records and continues the id sequence.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened or schema initialization fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database (nothing is persisted).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open a database and pin its dimensionality before any insert.
    ///
    /// # Errors
    ///
    /// Returns `Error::MismatchedDimensions` if the store already established
    /// a different dimensionality.
    pub fn open_with_dimensions(path: &Path, dims: usize) -> Result<Self> {
        let db = Self::open(path)?;
        db.pin_dimensions(dims)?;
        Ok(db)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Fix the store's dimensionality, or verify it matches if already set.
    pub fn pin_dimensions(&self, dims: usize) -> Result<()> {
        if dims == 0 {
            return Err(Error::EmptyEmbedding);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        match read_dimensions(&tx)? {
            Some(existing) if existing != dims => {
                return Err(Error::MismatchedDimensions {
                    expected: existing,
                    actual: dims,
                });
            }
            Some(_) => {}
            None => write_dimensions(&tx, dims)?,
        }
        tx.commit()?;
        Ok(())
    }

    /// Dimensionality shared by every record, once established.
    pub fn dimensions(&self) -> Result<Option<usize>> {
        let conn = self.lock()?;
        read_dimensions(&conn)
    }

    /// Insert a new memory with embedding and return its id.
    ///
    /// The first insert into an unpinned store establishes its dimensionality.
    /// The record is committed before this returns.
    ///
    /// # Errors
    ///
    /// Returns `Error::MismatchedDimensions` if the embedding length differs
    /// from the established dimensionality; nothing is written in that case.
    pub fn insert(
        &self,
        text: &str,
        embedding: &[f32],
        metadata: Option<&Metadata>,
    ) -> Result<i64> {
        let blob = vec_to_blob(embedding)?;
        let metadata_json = metadata
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| Error::Corrupted(format!("unserializable metadata: {}", e)))?;
        let now = Utc::now().to_rfc3339();

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let established = read_dimensions(&tx)?;
        if let Some(expected) = established {
            if expected != embedding.len() {
                return Err(Error::MismatchedDimensions {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        tx.execute(
            r#"
            INSERT INTO memories (text, embedding, metadata, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![text, &blob, metadata_json, &now],
        )?;
        let id = tx.last_insert_rowid();

        if established.is_none() {
            write_dimensions(&tx, embedding.len())?;
        }

        tx.commit()?;
        Ok(id)
    }
}
