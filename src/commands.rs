//! Command handlers for mnemos CLI.

use mnemos::embedding::Embedder;
use mnemos::errors::Error;
use mnemos::output::*;
use mnemos::{Config, MemoryStore, Metadata, DEFAULT_TRAVERSAL_DEPTH};
use std::process::ExitCode;

/// Commands supported by mnemos CLI.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Embed and store a memory
    Store {
        /// Memory text
        text: String,

        /// Optional JSON object attached to the memory
        #[arg(short = 'm', long)]
        metadata: Option<String>,
    },
    /// Find memories semantically similar to a query
    Search {
        /// Search query text
        query: String,

        /// Maximum number of results (default: config search_limit); 0 or less returns nothing
        #[arg(short = 'l', long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Drop results scoring below this similarity (default: config min_similarity)
        #[arg(long, allow_hyphen_values = true)]
        min_similarity: Option<f64>,
    },
    /// Show one memory
    Get {
        /// Memory ID
        id: i64,
    },
    /// List the most recent memories
    List {
        /// Maximum number of results (default: 10)
        #[arg(short = 'l', long, default_value = "10")]
        limit: usize,
    },
    /// Link two memories with a typed relationship
    Relate {
        /// Source memory ID
        from_id: i64,

        /// Target memory ID
        to_id: i64,

        /// Relationship type, e.g. RELATES_TO
        kind: String,

        /// Optional JSON object attached to the relationship
        #[arg(short = 'p', long)]
        properties: Option<String>,
    },
    /// Find memories connected to one through relationships
    Connections {
        /// Starting memory ID
        id: i64,

        /// Maximum number of relationships to follow
        #[arg(short = 'd', long, default_value_t = DEFAULT_TRAVERSAL_DEPTH)]
        depth: usize,
    },
    /// Show memory count and embedding dimensionality
    Stats,
    Version,
}

impl Commands {
    /// True when the command needs an open store (and therefore an embedder).
    pub fn needs_store(&self) -> bool {
        !matches!(self, Commands::Version)
    }
}

/// Execute a CLI command.
pub fn execute<E: Embedder>(
    command: &Commands,
    store: &mut MemoryStore<E>,
    config: &Config,
    json: bool,
) -> Result<ExitCode, Error> {
    match command {
        Commands::Store { text, metadata } => handle_store(store, text, metadata.as_deref(), json),
        Commands::Search {
            query,
            limit,
            min_similarity,
        } => handle_search(
            store,
            query,
            limit.map_or(config.search_limit, clamp_limit),
            min_similarity.unwrap_or(config.min_similarity),
            json,
        ),
        Commands::Get { id } => handle_get(store, *id, json),
        Commands::List { limit } => handle_list(store, *limit, json),
        Commands::Relate {
            from_id,
            to_id,
            kind,
            properties,
        } => handle_relate(store, *from_id, *to_id, kind, properties.as_deref(), json),
        Commands::Connections { id, depth } => handle_connections(store, *id, *depth, json),
        Commands::Stats => handle_stats(store, json),
        Commands::Version => handle_version(json),
    }
}

/// Non-positive search limits mean "no results".
fn clamp_limit(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

/// Parse `--metadata`; only JSON objects are accepted.
fn parse_metadata(raw: &str) -> Result<Metadata, Error> {
    parse_object(raw, "metadata")
}

fn parse_object(raw: &str, what: &str) -> Result<Metadata, Error> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| Error::Validation(format!("Invalid {what} JSON: {e}")))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(Error::Validation(format!("{what} must be a JSON object"))),
    }
}

fn handle_store<E: Embedder>(
    store: &mut MemoryStore<E>,
    text: &str,
    metadata: Option<&str>,
    json: bool,
) -> Result<ExitCode, Error> {
    let metadata = metadata.map(parse_metadata).transpose()?;
    let id = store.store_memory(text, metadata.as_ref())?;
    if json {
        print_json(&StoreResponse {
            status: "stored".to_string(),
            id,
        });
    } else {
        println!("{}", format_store_response(id));
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_search<E: Embedder>(
    store: &mut MemoryStore<E>,
    query: &str,
    limit: usize,
    min_similarity: f64,
    json: bool,
) -> Result<ExitCode, Error> {
    let results = store.search_memory(query, limit, min_similarity)?;
    if json {
        print_json(&SearchResponse {
            results: results.into_iter().map(SearchResultItem::from).collect(),
        });
    } else {
        println!("{}", format_search_results(&results));
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_get<E: Embedder>(store: &MemoryStore<E>, id: i64, json: bool) -> Result<ExitCode, Error> {
    let memory = store.get(id)?.ok_or(Error::NotFound(id))?;
    let relationships = store.relationships(id)?;
    if json {
        let mut response = GetResponse::from(memory);
        response.relationships = relationships.into_iter().map(RelationshipItem::from).collect();
        print_json(&response);
    } else {
        println!("ID: {}", memory.id);
        println!("Text: {}", memory.text);
        if let Some(meta) = &memory.metadata {
            println!("Metadata: {}", serde_json::Value::Object(meta.clone()));
        }
        println!("Dimensions: {}", memory.embedding.len());
        println!("Created: {}", memory.created_at.to_rfc3339());
        for relationship in &relationships {
            println!("Relationship: {}", format_relationship(relationship));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_relate<E: Embedder>(
    store: &MemoryStore<E>,
    from_id: i64,
    to_id: i64,
    kind: &str,
    properties: Option<&str>,
    json: bool,
) -> Result<ExitCode, Error> {
    let properties = properties
        .map(|raw| parse_object(raw, "properties"))
        .transpose()?;
    let created = store.add_relationship(from_id, to_id, kind, properties.as_ref())?;
    let kind = kind.trim();
    if json {
        print_json(&RelationshipResponse {
            status: if created { "created" } else { "exists" }.to_string(),
            from_id,
            to_id,
            kind: kind.to_string(),
        });
    } else {
        println!(
            "{}",
            format_relationship_response(from_id, to_id, kind, created)
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_connections<E: Embedder>(
    store: &MemoryStore<E>,
    id: i64,
    depth: usize,
    json: bool,
) -> Result<ExitCode, Error> {
    let connected = store.explore_connections(id, depth)?;
    if json {
        let memories: Vec<ConnectionItem> =
            connected.into_iter().map(ConnectionItem::from).collect();
        print_json(&ConnectionsResponse {
            count: memories.len(),
            memories,
        });
    } else {
        println!("{}", format_connections(&connected));
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_list<E: Embedder>(
    store: &MemoryStore<E>,
    limit: usize,
    json: bool,
) -> Result<ExitCode, Error> {
    let memories = store.list(limit)?;
    if json {
        let items: Vec<ListItem> = memories
            .into_iter()
            .map(|m| ListItem {
                id: m.id,
                text: m.text,
                created_at: m.created_at.to_rfc3339(),
            })
            .collect();
        print_json(&ListResponse { memories: items });
    } else {
        for memory in memories {
            println!("{}: {}", memory.id, memory.text);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_stats<E: Embedder>(store: &MemoryStore<E>, json: bool) -> Result<ExitCode, Error> {
    let memories = store.count()?;
    let dimensions = store.dimensions()?;
    if json {
        print_json(&StatsResponse {
            memories,
            dimensions,
        });
    } else {
        println!("Memories: {}", memories);
        match dimensions {
            Some(dims) => println!("Dimensions: {}", dims),
            None => println!("Dimensions: not yet established"),
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn handle_version(json: bool) -> Result<ExitCode, Error> {
    if json {
        print_json(&serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "name": env!("CARGO_PKG_NAME")
        }));
    } else {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos::Database;
    use std::sync::Arc;

    struct Constant;

    impl Embedder for Constant {
        fn embed(&mut self, _text: &str) -> Result<Vec<f32>, Error> {
            Ok(vec![1.0, 0.0, 0.0])
        }
    }

    fn store() -> MemoryStore<Constant> {
        let db = Arc::new(Database::open_in_memory().unwrap());
        MemoryStore::new(db, Constant).unwrap()
    }

    #[test]
    fn test_parse_metadata_object() {
        let meta = parse_metadata(r#"{"source": "chat", "turn": 3}"#).unwrap();
        assert_eq!(meta["source"], "chat");
        assert_eq!(meta["turn"], 3);
    }

    #[test]
    fn test_parse_metadata_rejects_non_object() {
        for raw in ["[1, 2]", "\"text\"", "42", "null"] {
            let err = parse_metadata(raw).unwrap_err();
            assert!(err.is_validation(), "{raw} accepted");
        }
    }

    #[test]
    fn test_parse_metadata_rejects_malformed() {
        assert!(parse_metadata("{not json").unwrap_err().is_validation());
    }

    #[test]
    fn test_store_with_metadata_persists() {
        let mut store = store();
        handle_store(&mut store, "hello", Some(r#"{"k": "v"}"#), true).unwrap();

        let memory = store.get(1).unwrap().unwrap();
        assert_eq!(memory.metadata.unwrap()["k"], "v");
    }

    #[test]
    fn test_store_bad_metadata_stores_nothing() {
        let mut store = store();
        assert!(handle_store(&mut store, "hello", Some("[]"), false).is_err());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = store();
        assert!(matches!(
            handle_get(&store, 99, false),
            Err(Error::NotFound(99))
        ));
    }

    #[test]
    fn test_search_uses_config_defaults() {
        let mut store = store();
        store.store_memory("first", None).unwrap();
        let config = Config {
            search_limit: 1,
            ..Default::default()
        };
        let command = Commands::Search {
            query: "anything".to_string(),
            limit: None,
            min_similarity: None,
        };
        assert!(execute(&command, &mut store, &config, true).is_ok());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(3), 3);
        assert_eq!(clamp_limit(0), 0);
        assert_eq!(clamp_limit(-1), 0);
        assert_eq!(clamp_limit(i64::MIN), 0);
    }

    #[test]
    fn test_search_negative_limit_returns_nothing() {
        let mut store = store();
        store.store_memory("first", None).unwrap();
        let command = Commands::Search {
            query: "first".to_string(),
            limit: Some(-1),
            min_similarity: Some(-1.0),
        };
        assert!(execute(&command, &mut store, &Config::default(), true).is_ok());
        assert!(store.search_memory("first", clamp_limit(-1), -1.0).unwrap().is_empty());
    }

    #[test]
    fn test_relate_then_connections() {
        let mut store = store();
        let a = store.store_memory("a", None).unwrap();
        let b = store.store_memory("b", None).unwrap();

        handle_relate(&store, a, b, "RELATES_TO", Some(r#"{"why": "test"}"#), true).unwrap();
        // repeating the same link is reported, not an error
        handle_relate(&store, a, b, "RELATES_TO", None, false).unwrap();
        assert!(handle_connections(&store, b, 1, true).is_ok());

        let links = store.relationships(a).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].properties.as_ref().unwrap()["why"], "test");
    }

    #[test]
    fn test_relate_rejects_non_object_properties() {
        let mut store = store();
        let a = store.store_memory("a", None).unwrap();
        let b = store.store_memory("b", None).unwrap();

        let err = handle_relate(&store, a, b, "RELATES_TO", Some("[1]"), false).unwrap_err();
        assert!(err.is_validation());
        assert!(store.relationships(a).unwrap().is_empty());
    }

    #[test]
    fn test_connections_missing_memory() {
        let store = store();
        assert!(matches!(
            handle_connections(&store, 7, 2, false),
            Err(Error::NotFound(7))
        ));
    }

    #[test]
    fn test_version_needs_no_store() {
        assert!(!Commands::Version.needs_store());
        assert!(Commands::Stats.needs_store());
    }
}
