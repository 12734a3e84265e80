//! Local ONNX embedding provider.
//!
//! Runs bge-small-en-v1.5 (384 dimensions) in-process with mean pooling and
//! L2 normalization. Model files come from the HuggingFace Hub cache and are
//! downloaded on first use.

use std::path::Path;

use hf_hub::api::sync::ApiBuilder;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams};

use super::{unavailable, Embedder};
use crate::errors::Error;

/// Embedding dimensions for bge-small-en-v1.5 model.
pub const EMBEDDING_DIMS: usize = 384;

const MAX_TOKENS: usize = 512;

/// ONNX embedding engine for synchronous text-to-vector conversion.
pub struct OnnxEmbedder {
    session: Session,
    tokenizer: Tokenizer,
    requires_token_type_ids: bool,
}

impl OnnxEmbedder {
    /// Load model from `cache_dir`, downloading it on first use.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmbeddingUnavailable` if the model cannot be fetched
    /// or the ONNX session cannot be built.
    pub fn new(model_id: &str, cache_dir: &Path) -> Result<Self, Error> {
        let api = ApiBuilder::new()
            .with_cache_dir(cache_dir.to_path_buf())
            .build()
            .map_err(unavailable)?;
        let repo = api.model(model_id.to_string());

        let model_path = repo
            .get("onnx/model.onnx")
            .or_else(|_| repo.get("model.onnx"))
            .map_err(unavailable)?;
        let tokenizer_path = repo.get("tokenizer.json").map_err(unavailable)?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path).map_err(unavailable)?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(unavailable)?;

        let session = Session::builder()
            .map_err(unavailable)?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .map_err(unavailable)?
            .commit_from_file(&model_path)
            .map_err(unavailable)?;

        let requires_token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        tracing::info!(model = model_id, "loaded ONNX embedding model");

        Ok(OnnxEmbedder {
            session,
            tokenizer,
            requires_token_type_ids,
        })
    }

    fn run(&mut self, text: &str) -> Result<Vec<f32>, Error> {
        let encoding = self.tokenizer.encode(text, true).map_err(unavailable)?;
        let input_ids = encoding.get_ids();
        let attention_mask = encoding.get_attention_mask();

        if input_ids.is_empty() {
            return Err(Error::EmbeddingUnavailable(
                "tokenizer produced no tokens".to_string(),
            ));
        }

        let seq_len = input_ids.len();
        let to_i64 = |values: &[u32]| values.iter().map(|&v| v as i64).collect::<Vec<i64>>();

        let input_ids_tensor =
            Tensor::from_array(([1usize, seq_len], to_i64(input_ids))).map_err(unavailable)?;
        let attention_mask_tensor =
            Tensor::from_array(([1usize, seq_len], to_i64(attention_mask))).map_err(unavailable)?;

        let outputs = if self.requires_token_type_ids {
            // Single sentence: all segment ids are zero.
            let token_type_ids_tensor =
                Tensor::from_array(([1usize, seq_len], vec![0i64; seq_len])).map_err(unavailable)?;
            self.session.run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            ])
        } else {
            self.session.run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor
            ])
        }
        .map_err(unavailable)?;

        let (shape, data) = outputs
            .get("last_hidden_state")
            .or_else(|| outputs.get("token_embeddings"))
            .ok_or_else(|| {
                Error::EmbeddingUnavailable(
                    "model output 'last_hidden_state' not found".to_string(),
                )
            })?
            .try_extract_tensor::<f32>()
            .map_err(unavailable)?;

        if shape.len() != 3 || shape[0] != 1 || shape[2] as usize != EMBEDDING_DIMS {
            return Err(Error::EmbeddingUnavailable(format!(
                "unexpected output shape {:?}, expected [1, seq_len, {}]",
                shape, EMBEDDING_DIMS
            )));
        }

        Ok(mean_pool(data, attention_mask, seq_len, EMBEDDING_DIMS))
    }
}

impl Embedder for OnnxEmbedder {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, Error> {
        let pooled = self.run(text)?;
        Ok(l2_normalize(&pooled))
    }

    fn dimensions(&self) -> Option<usize> {
        Some(EMBEDDING_DIMS)
    }
}

/// Average token vectors, counting only positions the attention mask keeps.
fn mean_pool(data: &[f32], attention_mask: &[u32], seq_len: usize, hidden: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden];

    for (token_idx, chunk) in data.chunks(hidden).take(seq_len).enumerate() {
        let mask = attention_mask.get(token_idx).copied().unwrap_or(0) as f32;
        for (value, x) in pooled.iter_mut().zip(chunk) {
            *value += x * mask;
        }
    }

    let mask_sum = attention_mask
        .iter()
        .take(seq_len)
        .map(|&m| m as f32)
        .sum::<f32>()
        .max(1e-9);

    pooled.iter_mut().for_each(|v| *v /= mask_sum);
    pooled
}

fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|&x| x * x).sum::<f32>().sqrt().max(1e-9);
    vec.iter().map(|&x| x / norm).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize_magnitude() {
        let normalized = l2_normalize(&[3.0, 4.0]);
        let norm: f32 = normalized.iter().map(|&x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        assert_eq!(l2_normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_mean_pool_respects_mask() {
        // Two tokens of width 2; the second is padding.
        let data = [1.0, 3.0, 100.0, 100.0];
        let pooled = mean_pool(&data, &[1, 0], 2, 2);
        assert_eq!(pooled, vec![1.0, 3.0]);
    }

    #[test]
    fn test_mean_pool_averages() {
        let data = [1.0, 2.0, 3.0, 4.0];
        let pooled = mean_pool(&data, &[1, 1], 2, 2);
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[ignore]
    #[test]
    fn test_integration_simple_text() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut engine = OnnxEmbedder::new("BAAI/bge-small-en-v1.5", dir.path()).expect("load model");
        let embedding = engine.embed("hello world").expect("embed text");

        assert_eq!(embedding.len(), EMBEDDING_DIMS);
        let norm: f32 = embedding.iter().map(|&x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01, "Embedding should be L2-normalized");
        assert!(embedding.iter().all(|&x| x.is_finite()));
    }

    #[ignore]
    #[test]
    fn test_integration_long_text_truncation() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut engine = OnnxEmbedder::new("BAAI/bge-small-en-v1.5", dir.path()).expect("load model");
        let embedding = engine
            .embed(&"This is a sentence. ".repeat(300))
            .expect("embed long text");
        assert_eq!(embedding.len(), EMBEDDING_DIMS);
    }
}
