//! Read operations: full scan, lookup by id, and listing.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{embedding, read_dimensions, Database, Error};
use crate::memory_types::{Memory, Metadata};

pub type Result<T> = std::result::Result<T, Error>;

const MAX_LIST_LIMIT: usize = 10_000;

pub(super) const SELECT_COLUMNS: &str = "SELECT id, text, embedding, metadata, created_at FROM memories";

/// Raw column values of one `memories` row, decoded outside the row callback.
pub(super) type RawRow = (i64, String, Vec<u8>, Option<String>, String);

/// Validate list limit is within acceptable bounds.
pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(Error::InvalidLimit(
            "Limit must be greater than 0".to_string(),
        ));
    }
    if limit > MAX_LIST_LIMIT {
        return Err(Error::InvalidLimit(format!(
            "Limit {} exceeds maximum allowed ({})",
            limit, MAX_LIST_LIMIT
        )));
    }
    Ok(())
}

pub(super) fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

/// Decode a raw row, checking the embedding against the store's dimensionality.
pub(super) fn decode(raw: RawRow, dims: Option<usize>) -> Result<Memory> {
    let (id, text, blob, metadata_json, created_at) = raw;

    let embedding = embedding::blob_to_vec(&blob)?;
    if let Some(expected) = dims {
        if embedding.len() != expected {
            return Err(Error::MismatchedDimensions {
                expected,
                actual: embedding.len(),
            });
        }
    }

    let metadata = metadata_json
        .map(|json| serde_json::from_str::<Metadata>(&json))
        .transpose()
        .map_err(|e| Error::Corrupted(format!("memory {}: invalid metadata: {}", id, e)))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| {
            Error::Corrupted(format!(
                "memory {}: invalid timestamp {:?}: {}",
                id, created_at, e
            ))
        })?
        .with_timezone(&Utc);

    Ok(Memory {
        id,
        text,
        embedding,
        metadata,
        created_at,
    })
}

impl Database {
    /// Return every stored memory in insertion (ascending id) order.
    ///
    /// Runs under the connection lock, so the result is a consistent snapshot
    /// of committed records.
    ///
    /// # Errors
    ///
    /// Returns `Error::MismatchedDimensions` or `Error::InvalidBlobSize` if a
    /// stored embedding is corrupt, or a database error if the query fails.
    pub fn scan_all(&self) -> Result<Vec<Memory>> {
        let conn = self.lock()?;
        let dims = read_dimensions(&conn)?;

        let mut stmt = conn.prepare(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))?;
        let rows = stmt
            .query_map([], read_raw)?
            .collect::<rusqlite::Result<Vec<RawRow>>>()?;

        rows.into_iter().map(|raw| decode(raw, dims)).collect()
    }

    /// Retrieve a single memory by id, or `None` if it does not exist.
    pub fn get(&self, id: i64) -> Result<Option<Memory>> {
        let conn = self.lock()?;
        let dims = read_dimensions(&conn)?;

        let raw = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                [id],
                read_raw,
            )
            .optional()?;

        raw.map(|raw| decode(raw, dims)).transpose()
    }

    /// List the most recent memories, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the limit is invalid or the query fails.
    pub fn list(&self, limit: usize) -> Result<Vec<Memory>> {
        validate_limit(limit)?;

        let conn = self.lock()?;
        let dims = read_dimensions(&conn)?;

        let mut stmt = conn.prepare(&format!("{} ORDER BY id DESC LIMIT ?1", SELECT_COLUMNS))?;
        let rows = stmt
            .query_map(params![limit as i64], read_raw)?
            .collect::<rusqlite::Result<Vec<RawRow>>>()?;

        rows.into_iter().map(|raw| decode(raw, dims)).collect()
    }

    /// Number of stored memories.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_validate_limit_zero() {
        assert!(validate_limit(0).is_err());
    }

    #[test]
    fn test_validate_limit_too_large() {
        assert!(validate_limit(100_000).is_err());
    }

    #[test]
    fn test_validate_limit_valid() {
        assert!(validate_limit(10).is_ok());
        assert!(validate_limit(MAX_LIST_LIMIT).is_ok());
    }

    #[test]
    fn test_scan_all_empty() {
        let db = create_test_db();
        assert!(db.scan_all().unwrap().is_empty());
    }

    #[test]
    fn test_scan_all_insertion_order() {
        let db = create_test_db();
        let a = db.insert("alpha", &[1.0, 0.0], None).unwrap();
        let b = db.insert("beta", &[0.0, 1.0], None).unwrap();

        let memories = db.scan_all().unwrap();
        assert_eq!(memories.len(), 2);
        assert_eq!(memories[0].id, a);
        assert_eq!(memories[0].text, "alpha");
        assert_eq!(memories[0].embedding, vec![1.0, 0.0]);
        assert_eq!(memories[1].id, b);
        assert_eq!(memories[1].metadata, None);
    }

    #[test]
    fn test_scan_all_detects_corrupt_dimensions() {
        let db = create_test_db();
        db.insert("ok", &[1.0, 0.0], None).unwrap();
        {
            let conn = db.lock().unwrap();
            let blob = embedding::vec_to_blob(&[1.0, 2.0, 3.0]).unwrap();
            conn.execute(
                "INSERT INTO memories (text, embedding, metadata, created_at) VALUES ('bad', ?1, NULL, ?2)",
                params![blob, Utc::now().to_rfc3339()],
            )
            .unwrap();
        }

        assert!(matches!(
            db.scan_all(),
            Err(Error::MismatchedDimensions {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_get_existing() {
        let db = create_test_db();
        let id = db.insert("find me", &[0.2, 0.4], None).unwrap();

        let memory = db.get(id).unwrap().unwrap();
        assert_eq!(memory.id, id);
        assert_eq!(memory.text, "find me");
    }

    #[test]
    fn test_get_nonexistent() {
        let db = create_test_db();
        assert!(db.get(42).unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let db = create_test_db();
        let first = db.insert("first", &[1.0], None).unwrap();
        let second = db.insert("second", &[1.0], None).unwrap();

        let memories = db.list(10).unwrap();
        assert_eq!(memories.len(), 2);
        assert_eq!(memories[0].id, second);
        assert_eq!(memories[1].id, first);
    }

    #[test]
    fn test_list_limit() {
        let db = create_test_db();
        for i in 0..5 {
            db.insert(&format!("content {}", i), &[0.1, 0.2], None)
                .unwrap();
        }
        assert_eq!(db.list(2).unwrap().len(), 2);
        assert!(matches!(db.list(0), Err(Error::InvalidLimit(_))));
    }

    #[test]
    fn test_count() {
        let db = create_test_db();
        assert_eq!(db.count().unwrap(), 0);
        db.insert("one", &[1.0], None).unwrap();
        assert_eq!(db.count().unwrap(), 1);
    }
}
