//! Embedding providers.
//!
//! The memory store only depends on the [`Embedder`] trait; providers are
//! picked at startup from configuration.

mod http;
mod onnx;

pub use http::HttpEmbedder;
pub use onnx::{OnnxEmbedder, EMBEDDING_DIMS};

use std::time::Duration;

use crate::config::{Config, EmbeddingProvider};
use crate::errors::Error;

/// Converts text into a fixed-length embedding vector.
///
/// `embed` takes `&mut self` because local inference mutates session state.
pub trait Embedder {
    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmbeddingUnavailable` if the provider cannot produce a vector.
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, Error>;

    /// Output dimensionality, when the provider knows it ahead of time.
    fn dimensions(&self) -> Option<usize> {
        None
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, Error> {
        (**self).embed(text)
    }

    fn dimensions(&self) -> Option<usize> {
        (**self).dimensions()
    }
}

pub(crate) fn unavailable(err: impl std::fmt::Display) -> Error {
    Error::EmbeddingUnavailable(err.to_string())
}

/// Reject vectors no similarity can be computed over.
///
/// # Errors
///
/// Returns `Error::EmbeddingUnavailable` if the vector is empty or holds
/// NaN/infinite values.
pub fn validate_embedding(embedding: &[f32]) -> Result<(), Error> {
    if embedding.is_empty() {
        return Err(Error::EmbeddingUnavailable(
            "provider returned an empty vector".to_string(),
        ));
    }
    if let Some(pos) = embedding.iter().position(|x| !x.is_finite()) {
        return Err(Error::EmbeddingUnavailable(format!(
            "provider returned a non-finite value at index {}",
            pos
        )));
    }
    Ok(())
}

/// Build the embedder selected by configuration.
pub fn from_config(config: &Config) -> Result<Box<dyn Embedder + Send>, Error> {
    match config.embedding_provider {
        EmbeddingProvider::Onnx => Ok(Box::new(OnnxEmbedder::new(
            &config.embedding_model,
            &config.model_cache,
        )?)),
        EmbeddingProvider::Http => {
            let mut embedder = HttpEmbedder::new(
                &config.embedding_base_url,
                &config.embedding_model,
                config.embedding_api_key.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )?;
            if let Some(dims) = config.embedding_dimensions {
                embedder = embedder.with_dimensions(dims);
            }
            Ok(Box::new(embedder))
        }
    }
}
