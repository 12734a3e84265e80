//! Configuration system for mnemos.

mod env_parser;
mod loader;
mod overrides;
mod paths;
mod validation;

#[cfg(test)]
mod tests_utils;

use crate::errors::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use loader::{default_config_path, ConfigLayer};

/// Which embedding provider turns text into vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local ONNX model downloaded from the HuggingFace Hub.
    Onnx,
    /// OpenAI-compatible HTTP `/embeddings` endpoint.
    Http,
}

impl EmbeddingProvider {
    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            EmbeddingProvider::Onnx => "BAAI/bge-small-en-v1.5",
            EmbeddingProvider::Http => "nomic-embed-text",
        }
    }
}

impl FromStr for EmbeddingProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(EmbeddingProvider::Onnx),
            "http" => Ok(EmbeddingProvider::Http),
            other => Err(Error::Config(format!(
                "Unknown embedding provider '{}' (expected 'onnx' or 'http')",
                other
            ))),
        }
    }
}

/// Configuration values with priority: defaults < config file < env vars.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database.
    pub database_path: PathBuf,
    pub embedding_provider: EmbeddingProvider,
    /// Model identifier (HuggingFace id for onnx, served model name for http).
    pub embedding_model: String,
    /// Base URL of the HTTP embedding service.
    pub embedding_base_url: String,
    pub embedding_api_key: Option<String>,
    /// Pins the store's dimensionality ahead of the first insert.
    pub embedding_dimensions: Option<usize>,
    /// Directory for caching ONNX models.
    pub model_cache: PathBuf,
    /// Timeout for HTTP embedding requests.
    pub request_timeout_secs: u64,
    /// Default maximum number of search results.
    pub search_limit: usize,
    /// Default minimum similarity for search results.
    pub min_similarity: f64,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        let mnemos_dir = home.join(".mnemos");
        let provider = EmbeddingProvider::Onnx;

        Self {
            database_path: mnemos_dir.join("memories.db"),
            embedding_provider: provider,
            embedding_model: provider.default_model().to_string(),
            embedding_base_url: "http://localhost:1234/v1".to_string(),
            embedding_api_key: None,
            embedding_dimensions: None,
            model_cache: mnemos_dir.join("models"),
            request_timeout_secs: 30,
            search_limit: 5,
            min_similarity: 0.0,
        }
    }
}

impl Config {
    /// Load configuration from the default config file location and env vars.
    pub fn load() -> Result<Self, Error> {
        Self::load_from(&default_config_path())
    }

    /// Load configuration using `config_path` as the TOML file (if it exists).
    pub fn load_from(config_path: &Path) -> Result<Self, Error> {
        let file_layer = loader::load_from_file(config_path)?.unwrap_or_default();
        let env_layer = overrides::env_layer()?;

        let config = Self::from_layers(&[file_layer, env_layer]);
        config.validate()?;

        tracing::debug!(
            database = %config.database_path.display(),
            provider = ?config.embedding_provider,
            model = %config.embedding_model,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Resolve defaults overlaid by each layer in order (later layers win).
    ///
    /// When no layer names a model, the selected provider's default is used.
    pub fn from_layers(layers: &[ConfigLayer]) -> Self {
        let mut config = Config::default();
        let mut model = None;

        for layer in layers {
            let layer = layer.clone();
            if let Some(path) = layer.database_path {
                config.database_path = paths::expand_tilde_path(&path);
            }
            if let Some(provider) = layer.embedding_provider {
                config.embedding_provider = provider;
            }
            if layer.embedding_model.is_some() {
                model = layer.embedding_model;
            }
            if let Some(url) = layer.embedding_base_url {
                config.embedding_base_url = url;
            }
            if layer.embedding_api_key.is_some() {
                config.embedding_api_key = layer.embedding_api_key;
            }
            if layer.embedding_dimensions.is_some() {
                config.embedding_dimensions = layer.embedding_dimensions;
            }
            if let Some(cache) = layer.model_cache {
                config.model_cache = paths::expand_tilde_path(&cache);
            }
            if let Some(timeout) = layer.request_timeout_secs {
                config.request_timeout_secs = timeout;
            }
            if let Some(limit) = layer.search_limit {
                config.search_limit = limit;
            }
            if let Some(min) = layer.min_similarity {
                config.min_similarity = min;
            }
        }

        config.embedding_model =
            model.unwrap_or_else(|| config.embedding_provider.default_model().to_string());
        config
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), Error> {
        validation::ConfigValidator::new(self).validate()
    }

    /// Ensure parent directories for database and cache paths exist.
    pub fn ensure_directories(&self) -> Result<(), Error> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Config(format!(
                        "Failed to create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        if self.embedding_provider == EmbeddingProvider::Onnx
            && !self.model_cache.as_os_str().is_empty()
        {
            std::fs::create_dir_all(&self.model_cache).map_err(|e| {
                Error::Config(format!(
                    "Failed to create model cache directory {}: {e}",
                    self.model_cache.display()
                ))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::tests_utils::{cleanup_env_vars, ENV_MUTEX};
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.database_path.ends_with(".mnemos/memories.db"));
        assert_eq!(config.embedding_provider, EmbeddingProvider::Onnx);
        assert_eq!(config.embedding_model, "BAAI/bge-small-en-v1.5");
        assert!(config.model_cache.ends_with(".mnemos/models"));
        assert_eq!(config.search_limit, 5);
        assert_eq!(config.min_similarity, 0.0);
        assert_eq!(config.embedding_dimensions, None);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("HTTP".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Http);
        assert_eq!(" onnx ".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Onnx);
        assert!(matches!(
            "grpc".parse::<EmbeddingProvider>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_layers_later_wins() {
        let file = ConfigLayer {
            search_limit: Some(10),
            min_similarity: Some(0.2),
            ..Default::default()
        };
        let env = ConfigLayer {
            search_limit: Some(3),
            ..Default::default()
        };

        let config = Config::from_layers(&[file, env]);
        assert_eq!(config.search_limit, 3);
        assert_eq!(config.min_similarity, 0.2);
    }

    #[test]
    fn test_provider_switch_picks_provider_default_model() {
        let layer = ConfigLayer {
            embedding_provider: Some(EmbeddingProvider::Http),
            ..Default::default()
        };
        let config = Config::from_layers(&[layer]);
        assert_eq!(config.embedding_model, "nomic-embed-text");
    }

    #[test]
    fn test_explicit_model_kept_across_provider_switch() {
        let file = ConfigLayer {
            embedding_model: Some("custom/model".to_string()),
            ..Default::default()
        };
        let env = ConfigLayer {
            embedding_provider: Some(EmbeddingProvider::Http),
            ..Default::default()
        };
        let config = Config::from_layers(&[file, env]);
        assert_eq!(config.embedding_model, "custom/model");
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();

        assert!(config.database_path.ends_with(".mnemos/memories.db"));
        assert_eq!(config.embedding_model, "BAAI/bge-small-en-v1.5");
    }

    #[test]
    fn test_load_from_file_then_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            database_path = "/data/memories.db"
            embedding_provider = "http"
            search_limit = 8
            "#,
        )
        .unwrap();

        // SAFETY: env mutation is serialized by ENV_MUTEX.
        unsafe { std::env::set_var("MNEMOS_SEARCH_LIMIT", "12"); }

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/data/memories.db"));
        assert_eq!(config.embedding_provider, EmbeddingProvider::Http);
        assert_eq!(config.search_limit, 12);

        cleanup_env_vars();
    }

    #[test]
    fn test_load_from_invalid_values_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "min_similarity = 3.5\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_ensure_directories_creates_parent() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            database_path: dir.path().join("nested/deeper/memories.db"),
            model_cache: dir.path().join("models"),
            ..Default::default()
        };

        config.ensure_directories().unwrap();
        assert!(dir.path().join("nested/deeper").is_dir());
        assert!(dir.path().join("models").is_dir());
    }
}
