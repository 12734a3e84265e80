//! Cosine similarity and brute-force ranking of stored memories.
//!
//! Every query scans the whole corpus (O(N·D)); the store is expected to hold
//! a modest number of records.

use std::cmp::Ordering;

use crate::errors::Error;
use crate::memory_types::{Memory, ScoredMemory};

/// Compute cosine similarity between two embedding vectors.
///
/// A zero-norm vector has no direction, so its similarity to anything is `0.0`.
/// The result is clamped to `[-1.0, 1.0]` to absorb floating-point drift.
///
/// # Errors
///
/// - `Error::Validation` if either vector is empty or holds NaN/infinite values.
/// - `Error::DimensionMismatch` if the vectors have different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, Error> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::Validation(
            "Cannot compute similarity with empty vector".to_string(),
        ));
    }

    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    if a.iter().chain(b.iter()).any(|x| !x.is_finite()) {
        return Err(Error::Validation(
            "Vector contains NaN or infinite values".to_string(),
        ));
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Rank candidates by similarity to `query`.
///
/// Drops candidates scoring strictly below `min_similarity`, orders the rest
/// by similarity descending (ties by ascending id) and keeps at most `limit`.
/// A `limit` of zero yields an empty result.
///
/// # Errors
///
/// Propagates `cosine_similarity` failures, e.g. `Error::DimensionMismatch`
/// when a candidate's embedding length differs from the query's.
pub fn rank(
    query: &[f32],
    candidates: Vec<Memory>,
    min_similarity: f64,
    limit: usize,
) -> Result<Vec<ScoredMemory>, Error> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut scored = Vec::with_capacity(candidates.len());
    for memory in candidates {
        let similarity = cosine_similarity(query, &memory.embedding)?;
        if similarity >= min_similarity {
            scored.push(ScoredMemory { memory, similarity });
        }
    }

    scored.sort_by(compare_ranked);
    scored.truncate(limit);
    Ok(scored)
}

fn compare_ranked(a: &ScoredMemory, b: &ScoredMemory) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.memory.id.cmp(&b.memory.id))
}
