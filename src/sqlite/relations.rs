//! Typed relationships between memories and traversal over them.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::scan::{decode, read_raw, SELECT_COLUMNS};
use super::{read_dimensions, Database, Error};
use crate::memory_types::{ConnectedMemory, Metadata, Relationship};

pub type Result<T> = std::result::Result<T, Error>;

/// Deepest traversal `connected` accepts.
pub const MAX_TRAVERSAL_DEPTH: usize = 5;

// Edges are walked in both directions; `walk` keeps every (id, depth) pair
// up to the depth bound and the outer query keeps the shortest.
const TRAVERSAL_SQL: &str = r#"
    WITH RECURSIVE
        edges(a, b) AS (
            SELECT from_id, to_id FROM relationships
            UNION
            SELECT to_id, from_id FROM relationships
        ),
        walk(id, depth) AS (
            SELECT ?1, 0
            UNION
            SELECT edges.b, walk.depth + 1
            FROM walk JOIN edges ON edges.a = walk.id
            WHERE walk.depth < ?2
        )
    SELECT id, MIN(depth) AS hops
    FROM walk
    WHERE id != ?1
    GROUP BY id
    ORDER BY hops, id
"#;

type RawRelationship = (i64, i64, i64, String, Option<String>, String);

/// Relationship kinds are identifiers such as `RELATES_TO` or `follows_from`.
pub fn validate_kind(kind: &str) -> Result<()> {
    let mut chars = kind.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid {
        return Err(Error::InvalidRelationship(format!(
            "type {:?} must start with a letter or underscore and contain only letters, digits and underscores",
            kind
        )));
    }
    Ok(())
}

fn memory_exists(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM memories WHERE id = ?1", [id], |_| Ok(()))
        .optional()?
        .is_some())
}

fn decode_relationship(raw: RawRelationship) -> Result<Relationship> {
    let (id, from_id, to_id, kind, properties_json, created_at) = raw;

    let properties = properties_json
        .map(|json| serde_json::from_str::<Metadata>(&json))
        .transpose()
        .map_err(|e| Error::Corrupted(format!("relationship {}: invalid properties: {}", id, e)))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Corrupted(format!("relationship {}: invalid timestamp: {}", id, e)))?
        .with_timezone(&Utc);

    Ok(Relationship {
        id,
        from_id,
        to_id,
        kind,
        properties,
        created_at,
    })
}

impl Database {
    /// Link two existing memories with a typed relationship.
    ///
    /// Returns `true` if the relationship was created, `false` if the same
    /// `(from, to, kind)` link already existed (its properties are kept).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRelationship` for self-links or malformed kinds,
    /// and `Error::MemoryNotFound` if either endpoint does not exist.
    pub fn add_relationship(
        &self,
        from_id: i64,
        to_id: i64,
        kind: &str,
        properties: Option<&Metadata>,
    ) -> Result<bool> {
        if from_id == to_id {
            return Err(Error::InvalidRelationship(format!(
                "memory {} cannot be related to itself",
                from_id
            )));
        }
        validate_kind(kind)?;

        let properties_json = properties
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| Error::Corrupted(format!("unserializable properties: {}", e)))?;
        let now = Utc::now().to_rfc3339();

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for id in [from_id, to_id] {
            if !memory_exists(&tx, id)? {
                return Err(Error::MemoryNotFound(id));
            }
        }

        let inserted = tx.execute(
            r#"
            INSERT INTO relationships (from_id, to_id, kind, properties, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (from_id, to_id, kind) DO NOTHING
            "#,
            params![from_id, to_id, kind, properties_json, &now],
        )?;

        tx.commit()?;
        Ok(inserted == 1)
    }

    /// Every relationship touching `memory_id`, in either direction, oldest first.
    pub fn relationships(&self, memory_id: i64) -> Result<Vec<Relationship>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, from_id, to_id, kind, properties, created_at
            FROM relationships
            WHERE from_id = ?1 OR to_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([memory_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<RawRelationship>>>()?;

        rows.into_iter().map(decode_relationship).collect()
    }

    /// Memories reachable from `memory_id` within `max_depth` relationships.
    ///
    /// Direction is ignored. Results are ordered by hop count, then id, and
    /// never include the starting memory.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLimit` if `max_depth` is outside
    /// `1..=MAX_TRAVERSAL_DEPTH`, or `Error::MemoryNotFound` if the start is missing.
    pub fn connected(&self, memory_id: i64, max_depth: usize) -> Result<Vec<ConnectedMemory>> {
        if max_depth == 0 || max_depth > MAX_TRAVERSAL_DEPTH {
            return Err(Error::InvalidLimit(format!(
                "Depth must be between 1 and {}, got {}",
                MAX_TRAVERSAL_DEPTH, max_depth
            )));
        }

        let conn = self.lock()?;
        if !memory_exists(&conn, memory_id)? {
            return Err(Error::MemoryNotFound(memory_id));
        }
        let dims = read_dimensions(&conn)?;

        let mut stmt = conn.prepare(TRAVERSAL_SQL)?;
        let reached = stmt
            .query_map(params![memory_id, max_depth as i64], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<(i64, i64)>>>()?;

        let mut fetch = conn.prepare(&format!("{} WHERE id = ?1", SELECT_COLUMNS))?;
        reached
            .into_iter()
            .map(|(id, hops)| -> Result<ConnectedMemory> {
                let raw = fetch.query_row([id], read_raw)?;
                Ok(ConnectedMemory {
                    memory: decode(raw, dims)?,
                    hops: hops as usize,
                })
            })
            .collect()
    }

    /// Number of stored relationships.
    pub fn relationship_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn db_with_memories(n: usize) -> Database {
        let db = Database::open_in_memory().unwrap();
        for i in 0..n {
            db.insert(&format!("memory {}", i + 1), &[1.0, 0.0], None)
                .unwrap();
        }
        db
    }

    fn hops_of(found: &[ConnectedMemory]) -> Vec<(i64, usize)> {
        found.iter().map(|c| (c.memory.id, c.hops)).collect()
    }

    #[test]
    fn test_validate_kind() {
        assert!(validate_kind("RELATES_TO").is_ok());
        assert!(validate_kind("_private2").is_ok());
        assert!(validate_kind("").is_err());
        assert!(validate_kind("2FAST").is_err());
        assert!(validate_kind("has space").is_err());
        assert!(validate_kind("DROP'--").is_err());
    }

    #[test]
    fn test_add_relationship_created_once() {
        let db = db_with_memories(2);
        assert!(db.add_relationship(1, 2, "RELATES_TO", None).unwrap());
        assert!(!db.add_relationship(1, 2, "RELATES_TO", None).unwrap());
        // a different kind is a different link
        assert!(db.add_relationship(1, 2, "SIMILAR_TO", None).unwrap());
        assert_eq!(db.relationship_count().unwrap(), 2);
    }

    #[test]
    fn test_add_relationship_missing_endpoint() {
        let db = db_with_memories(1);
        assert!(matches!(
            db.add_relationship(1, 9, "RELATES_TO", None),
            Err(Error::MemoryNotFound(9))
        ));
        assert_eq!(db.relationship_count().unwrap(), 0);
    }

    #[test]
    fn test_add_relationship_rejects_self_link() {
        let db = db_with_memories(1);
        assert!(matches!(
            db.add_relationship(1, 1, "RELATES_TO", None),
            Err(Error::InvalidRelationship(_))
        ));
    }

    #[test]
    fn test_relationship_properties_round_trip() {
        let db = db_with_memories(3);
        let props = json!({"reason": "same topic", "confidence": 0.9})
            .as_object()
            .cloned()
            .unwrap();
        db.add_relationship(1, 2, "RELATES_TO", Some(&props)).unwrap();
        db.add_relationship(3, 1, "FOLLOWS", None).unwrap();

        let links = db.relationships(1).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].to_id, 2);
        assert_eq!(links[0].properties, Some(props));
        assert_eq!(links[1].from_id, 3);
        assert_eq!(links[1].properties, None);
        assert_eq!(db.relationships(2).unwrap().len(), 1);
    }

    #[test]
    fn test_connected_walks_both_directions_with_depth_bound() {
        // 1 -> 2 -> 3 -> 4, and 5 -> 1
        let db = db_with_memories(5);
        db.add_relationship(1, 2, "NEXT", None).unwrap();
        db.add_relationship(2, 3, "NEXT", None).unwrap();
        db.add_relationship(3, 4, "NEXT", None).unwrap();
        db.add_relationship(5, 1, "NEXT", None).unwrap();

        assert_eq!(hops_of(&db.connected(1, 1).unwrap()), vec![(2, 1), (5, 1)]);
        assert_eq!(
            hops_of(&db.connected(1, 2).unwrap()),
            vec![(2, 1), (5, 1), (3, 2)]
        );
        assert_eq!(
            hops_of(&db.connected(4, 5).unwrap()),
            vec![(3, 1), (2, 2), (1, 3), (5, 4)]
        );
    }

    #[test]
    fn test_connected_reports_shortest_path_and_handles_cycles() {
        // triangle 1-2-3 plus 3-4
        let db = db_with_memories(4);
        db.add_relationship(1, 2, "LINK", None).unwrap();
        db.add_relationship(2, 3, "LINK", None).unwrap();
        db.add_relationship(3, 1, "LINK", None).unwrap();
        db.add_relationship(3, 4, "LINK", None).unwrap();

        assert_eq!(
            hops_of(&db.connected(1, 3).unwrap()),
            vec![(2, 1), (3, 1), (4, 2)]
        );
    }

    #[test]
    fn test_connected_isolated_memory() {
        let db = db_with_memories(2);
        assert!(db.connected(1, 2).unwrap().is_empty());
    }

    #[test]
    fn test_connected_validates_depth_and_start() {
        let db = db_with_memories(1);
        assert!(matches!(db.connected(1, 0), Err(Error::InvalidLimit(_))));
        assert!(matches!(
            db.connected(1, MAX_TRAVERSAL_DEPTH + 1),
            Err(Error::InvalidLimit(_))
        ));
        assert!(matches!(db.connected(42, 2), Err(Error::MemoryNotFound(42))));
    }

    #[test]
    fn test_relationships_leave_memories_untouched() {
        let db = db_with_memories(2);
        let before = db.scan_all().unwrap();
        db.add_relationship(1, 2, "RELATES_TO", None).unwrap();
        assert_eq!(db.scan_all().unwrap(), before);
    }
}
