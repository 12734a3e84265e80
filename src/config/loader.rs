//! Configuration file loading and parsing.

use crate::errors::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::EmbeddingProvider;

/// One layer of configuration values; unset fields leave lower layers intact.
///
/// Used both for the TOML file and for environment overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub database_path: Option<PathBuf>,
    pub embedding_provider: Option<EmbeddingProvider>,
    pub embedding_model: Option<String>,
    pub embedding_base_url: Option<String>,
    pub embedding_api_key: Option<String>,
    pub embedding_dimensions: Option<usize>,
    pub model_cache: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub search_limit: Option<usize>,
    pub min_similarity: Option<f64>,
}

/// `$XDG_CONFIG_HOME/mnemos/config.toml` (or the platform equivalent).
pub fn default_config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let config_dir = dirs::config_dir().unwrap_or_else(|| home.join(".config"));
    config_dir.join("mnemos/config.toml")
}

/// Load a configuration layer from a TOML file, if it exists.
pub fn load_from_file(config_path: &Path) -> Result<Option<ConfigLayer>, Error> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(config_path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {e}",
            config_path.display()
        ))
    })?;

    let layer: ConfigLayer = toml::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file {}: {e}",
            config_path.display()
        ))
    })?;

    Ok(Some(layer))
}
