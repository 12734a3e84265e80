//! Environment variable overrides for configuration.

use crate::errors::Error;

use super::env_parser::{parse_env_path, parse_env_string, parse_env_value, read_var};
use super::ConfigLayer;

/// Build a configuration layer from `MNEMOS_*` environment variables.
///
/// Set-but-empty variables are rejected rather than ignored.
pub fn env_layer() -> Result<ConfigLayer, Error> {
    let var = |name: &'static str| read_var(name).map(|value| (name, value));

    Ok(ConfigLayer {
        database_path: var("MNEMOS_DATABASE_PATH")
            .map(|(n, v)| parse_env_path(n, &v))
            .transpose()?,
        embedding_provider: var("MNEMOS_EMBEDDING_PROVIDER")
            .map(|(n, v)| parse_env_value(n, &v))
            .transpose()?,
        embedding_model: var("MNEMOS_EMBEDDING_MODEL")
            .map(|(n, v)| parse_env_string(n, &v))
            .transpose()?,
        embedding_base_url: var("MNEMOS_EMBEDDING_BASE_URL")
            .map(|(n, v)| parse_env_string(n, &v))
            .transpose()?,
        embedding_api_key: var("MNEMOS_EMBEDDING_API_KEY")
            .map(|(n, v)| parse_env_string(n, &v))
            .transpose()?,
        embedding_dimensions: var("MNEMOS_EMBEDDING_DIMENSIONS")
            .map(|(n, v)| parse_env_value(n, &v))
            .transpose()?,
        model_cache: var("MNEMOS_MODEL_CACHE")
            .map(|(n, v)| parse_env_path(n, &v))
            .transpose()?,
        request_timeout_secs: var("MNEMOS_REQUEST_TIMEOUT_SECS")
            .map(|(n, v)| parse_env_value(n, &v))
            .transpose()?,
        search_limit: var("MNEMOS_SEARCH_LIMIT")
            .map(|(n, v)| parse_env_value(n, &v))
            .transpose()?,
        min_similarity: var("MNEMOS_MIN_SIMILARITY")
            .map(|(n, v)| parse_env_value(n, &v))
            .transpose()?,
    })
}
