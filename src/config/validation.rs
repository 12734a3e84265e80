//! Configuration validation logic.

use crate::errors::Error;

use super::{Config, EmbeddingProvider};

/// Validates resolved configuration values.
pub struct ConfigValidator<'a> {
    config: &'a Config,
}

impl<'a> ConfigValidator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Validate all configuration values for correctness and constraints.
    ///
    /// Checks that:
    /// - Minimum similarity is finite and within [-1.0, 1.0]
    /// - Search limit, timeout and pinned dimensions are positive
    /// - Embedding model and database path are not empty
    /// - The HTTP provider has a base URL
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if any validation check fails.
    pub fn validate(&self) -> Result<(), Error> {
        self.validate_min_similarity()?;
        self.validate_positive_counts()?;
        self.validate_embedding_model()?;
        self.validate_database_path()?;
        self.validate_base_url()?;

        Ok(())
    }

    fn validate_min_similarity(&self) -> Result<(), Error> {
        let min = self.config.min_similarity;
        if !min.is_finite() {
            return Err(Error::Config(
                "Invalid min_similarity: NaN and infinity are not allowed".into(),
            ));
        }

        if !(-1.0..=1.0).contains(&min) {
            return Err(Error::Config(format!(
                "Invalid min_similarity: {} (must be between -1.0 and 1.0)",
                min
            )));
        }

        Ok(())
    }

    fn validate_positive_counts(&self) -> Result<(), Error> {
        if self.config.search_limit == 0 {
            return Err(Error::Config("search_limit must be at least 1".to_string()));
        }
        if self.config.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.config.embedding_dimensions == Some(0) {
            return Err(Error::Config(
                "embedding_dimensions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_embedding_model(&self) -> Result<(), Error> {
        if self.config.embedding_model.trim().is_empty() {
            return Err(Error::Config("Embedding model cannot be empty".to_string()));
        }

        Ok(())
    }

    fn validate_database_path(&self) -> Result<(), Error> {
        if self.config.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        Ok(())
    }

    fn validate_base_url(&self) -> Result<(), Error> {
        if self.config.embedding_provider == EmbeddingProvider::Http
            && self.config.embedding_base_url.trim().is_empty()
        {
            return Err(Error::Config(
                "embedding_base_url is required for the http provider".to_string(),
            ));
        }

        Ok(())
    }
}
