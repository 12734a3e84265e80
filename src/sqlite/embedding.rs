//! Embedding BLOB conversion.
//!
//! Vectors are stored as packed little-endian `f32` values, so a BLOB of
//! `4 * D` bytes decodes to a `D`-dimensional embedding.

use super::Error;

pub type Result<T> = std::result::Result<T, Error>;

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Convert a vector of f32 embedding values to a BLOB (little-endian bytes).
///
/// # Errors
///
/// Returns `Error::EmptyEmbedding` if the vector is empty.
pub fn vec_to_blob(vec: &[f32]) -> Result<Vec<u8>> {
    if vec.is_empty() {
        return Err(Error::EmptyEmbedding);
    }
    Ok(vec.iter().flat_map(|&x| x.to_le_bytes()).collect())
}

/// Convert a BLOB (little-endian bytes) to a vector of f32 embedding values.
///
/// # Errors
///
/// Returns `Error::InvalidBlobSize` if the blob is empty or its length is not
/// a multiple of 4 bytes.
pub fn blob_to_vec(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.is_empty() || blob.len() % F32_BYTES != 0 {
        return Err(Error::InvalidBlobSize { actual: blob.len() });
    }
    Ok(blob
        .chunks_exact(F32_BYTES)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_to_blob_size() {
        let blob = vec_to_blob(&[0.1f32; 768]).unwrap();
        assert_eq!(blob.len(), 3072);
    }

    #[test]
    fn test_vec_to_blob_empty() {
        assert!(matches!(vec_to_blob(&[]), Err(Error::EmptyEmbedding)));
    }

    #[test]
    fn test_blob_to_vec_preserves_values() {
        let original = vec![0.123f32, -4.5, 1e-7, f32::MAX];
        let decoded = blob_to_vec(&vec_to_blob(&original).unwrap()).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_blob_to_vec_truncated() {
        assert!(matches!(
            blob_to_vec(&[0u8; 10]),
            Err(Error::InvalidBlobSize { actual: 10 })
        ));
    }

    #[test]
    fn test_blob_to_vec_empty() {
        assert!(matches!(
            blob_to_vec(&[]),
            Err(Error::InvalidBlobSize { actual: 0 })
        ));
    }
}
