use ndarray::prelude::*;
use tracing::trace;

use crate::error::{AppError, AppResult};

/// Copy provider output into an `(n_texts, dim)` matrix, checking that exactly
/// `expected` vectors of one non-zero dimension came back.
#[tracing::instrument(name = "Converting embeddings", level = "trace", skip(embs))]
pub fn embeddings_to_ndarray(embs: &[Vec<f32>], expected: usize) -> AppResult<Array2<f64>> {
    if embs.len() != expected {
        return Err(AppError::EmbeddingCount {
            expected,
            found: embs.len(),
        });
    }
    let cols = embs.first().map_or(0, Vec::len);
    for (index, emb) in embs.iter().enumerate() {
        if emb.is_empty() || emb.len() != cols {
            return Err(AppError::EmbeddingDimension {
                index,
                expected: cols.max(1),
                found: emb.len(),
            });
        }
    }

    let mut arr: Array2<f64> = Array2::<f64>::zeros((embs.len(), cols));
    trace!("Initialized ndarray with shape: {:?}", arr.dim());
    for (mut row, emb) in arr.axis_iter_mut(Axis(0)).zip(embs) {
        for (val, &src) in row.iter_mut().zip(emb) {
            *val = src as f64;
        }
    }
    Ok(arr)
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn converts_embeddings_to_f64_ndarray() {
        let embs = vec![vec![1.0_f32, 2.5_f32], vec![3.75_f32, -4.0_f32]];

        let arr = embeddings_to_ndarray(&embs, 2).unwrap();

        assert_eq!(arr.dim(), (2, 2));
        let expected = array![[1.0_f64, 2.5_f64], [3.75_f64, -4.0_f64]];
        assert_eq!(arr, expected);
    }

    #[test]
    fn wrong_vector_count_is_rejected() {
        let embs = vec![vec![1.0_f32, 2.0_f32]];
        let err = embeddings_to_ndarray(&embs, 3).unwrap_err();
        assert!(matches!(err, AppError::EmbeddingCount { expected: 3, found: 1 }));
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let embs = vec![vec![1.0_f32, 2.0_f32], vec![1.0_f32]];
        let err = embeddings_to_ndarray(&embs, 2).unwrap_err();
        assert!(matches!(
            err,
            AppError::EmbeddingDimension {
                index: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn empty_vectors_are_rejected() {
        let embs = vec![Vec::<f32>::new()];
        assert!(matches!(
            embeddings_to_ndarray(&embs, 1),
            Err(AppError::EmbeddingDimension { index: 0, found: 0, .. })
        ));
    }
}
