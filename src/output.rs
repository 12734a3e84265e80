//! Tool-surface text formatting and JSON response types.

use serde::Serialize;

use crate::memory_types::{ConnectedMemory, Memory, Metadata, Relationship, ScoredMemory};

/// Message returned when a search yields nothing.
pub const NO_RESULTS_MESSAGE: &str = "No relevant memories found.";

/// Confirmation text for a stored memory.
pub fn format_store_response(id: i64) -> String {
    format!("Memory stored successfully with ID: {}", id)
}

/// Similarity as a one-decimal percentage, without a `-0.0`.
fn format_percent(similarity: f64) -> String {
    let percent = format!("{:.1}", similarity * 100.0);
    if percent == "-0.0" {
        "0.0".to_string()
    } else {
        percent
    }
}

/// Human-readable ranked list of search results.
///
/// ```
/// use mnemos::output::format_search_results;
///
/// assert_eq!(format_search_results(&[]), "No relevant memories found.");
/// ```
pub fn format_search_results(results: &[ScoredMemory]) -> String {
    if results.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let lines: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. [Similarity: {}%] {}",
                i + 1,
                format_percent(r.similarity),
                r.memory.text
            )
        })
        .collect();

    format!(
        "Found {} relevant memories:\n\n{}",
        results.len(),
        lines.join("\n")
    )
}

/// Confirmation text for `add_relationship`.
pub fn format_relationship_response(from_id: i64, to_id: i64, kind: &str, created: bool) -> String {
    if created {
        format!(
            "Relationship {} created between memories {} and {}",
            kind, from_id, to_id
        )
    } else {
        format!(
            "Relationship {} already exists between memories {} and {}",
            kind, from_id, to_id
        )
    }
}

/// Memories reached by `explore_connections`, nearest first.
pub fn format_connections(connected: &[ConnectedMemory]) -> String {
    if connected.is_empty() {
        return "No connected memories found.".to_string();
    }

    let lines: Vec<String> = connected
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. [Hops: {}] {}", i + 1, c.hops, c.memory.text))
        .collect();

    format!(
        "Found {} connected memories:\n\n{}",
        connected.len(),
        lines.join("\n")
    )
}

/// One line per relationship, e.g. `3 -[RELATES_TO]-> 5`.
pub fn format_relationship(relationship: &Relationship) -> String {
    format!(
        "{} -[{}]-> {}",
        relationship.from_id, relationship.kind, relationship.to_id
    )
}

/// Response for a stored memory.
#[derive(Serialize)]
pub struct StoreResponse {
    pub status: String,
    pub id: i64,
}

/// Response for search results.
#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
}

/// Individual search result item.
#[derive(Serialize)]
pub struct SearchResultItem {
    pub id: i64,
    pub text: String,
    pub similarity: f64,
    pub metadata: Option<Metadata>,
    pub created_at: String,
}

impl From<ScoredMemory> for SearchResultItem {
    fn from(scored: ScoredMemory) -> Self {
        Self {
            id: scored.memory.id,
            text: scored.memory.text,
            similarity: scored.similarity,
            metadata: scored.memory.metadata,
            created_at: scored.memory.created_at.to_rfc3339(),
        }
    }
}

/// Response for retrieving a specific memory.
#[derive(Serialize)]
pub struct GetResponse {
    pub id: i64,
    pub text: String,
    pub metadata: Option<Metadata>,
    pub dimensions: usize,
    pub created_at: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipItem>,
}

impl From<Memory> for GetResponse {
    fn from(memory: Memory) -> Self {
        Self {
            id: memory.id,
            text: memory.text,
            metadata: memory.metadata,
            dimensions: memory.embedding.len(),
            created_at: memory.created_at.to_rfc3339(),
            relationships: Vec::new(),
        }
    }
}

/// A relationship as reported by `get`.
#[derive(Serialize)]
pub struct RelationshipItem {
    pub from_id: i64,
    pub to_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: Option<Metadata>,
    pub created_at: String,
}

impl From<Relationship> for RelationshipItem {
    fn from(relationship: Relationship) -> Self {
        Self {
            from_id: relationship.from_id,
            to_id: relationship.to_id,
            kind: relationship.kind,
            properties: relationship.properties,
            created_at: relationship.created_at.to_rfc3339(),
        }
    }
}

/// Response for a new (or already present) relationship.
#[derive(Serialize)]
pub struct RelationshipResponse {
    pub status: String,
    pub from_id: i64,
    pub to_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Response for `connections`.
#[derive(Serialize)]
pub struct ConnectionsResponse {
    pub memories: Vec<ConnectionItem>,
    pub count: usize,
}

/// A memory reached through relationships.
#[derive(Serialize)]
pub struct ConnectionItem {
    pub id: i64,
    pub text: String,
    pub hops: usize,
    pub metadata: Option<Metadata>,
    pub created_at: String,
}

impl From<ConnectedMemory> for ConnectionItem {
    fn from(connected: ConnectedMemory) -> Self {
        Self {
            id: connected.memory.id,
            text: connected.memory.text,
            hops: connected.hops,
            metadata: connected.memory.metadata,
            created_at: connected.memory.created_at.to_rfc3339(),
        }
    }
}

/// Response for listing memories.
#[derive(Serialize)]
pub struct ListResponse {
    pub memories: Vec<ListItem>,
}

/// Individual list item.
#[derive(Serialize)]
pub struct ListItem {
    pub id: i64,
    pub text: String,
    pub created_at: String,
}

/// Response for store statistics.
#[derive(Serialize)]
pub struct StatsResponse {
    pub memories: usize,
    pub dimensions: Option<usize>,
}

/// Response for errors.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Print a value as formatted JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}
