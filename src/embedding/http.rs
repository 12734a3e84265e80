//! HTTP embedding provider for OpenAI-compatible `/embeddings` endpoints
//! (LM Studio, Ollama, OpenAI, ...).

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{unavailable, Embedder};
use crate::errors::Error;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Blocking client for a remote embedding service.
///
/// Failures are reported as `Error::EmbeddingUnavailable`; no retries.
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimensions: Option<usize>,
}

impl HttpEmbedder {
    /// Create a client for `{base_url}/embeddings`.
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(unavailable)?;

        Ok(Self {
            client,
            endpoint: endpoint_url(base_url),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            dimensions: None,
        })
    }

    /// Declare the provider's output size so the store can pin it up front.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = Some(dims);
        self
    }
}

impl Embedder for HttpEmbedder {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, Error> {
        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(unavailable)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::EmbeddingUnavailable(format!(
                "embedding service at {} returned status {}",
                self.endpoint, status
            )));
        }

        let body: EmbeddingResponse = response.json().map_err(unavailable)?;
        first_embedding(body)
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}

fn endpoint_url(base_url: &str) -> String {
    format!("{}/embeddings", base_url.trim_end_matches('/'))
}

fn first_embedding(body: EmbeddingResponse) -> Result<Vec<f32>, Error> {
    body.data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| Error::EmbeddingUnavailable("no embedding returned".to_string()))
}
