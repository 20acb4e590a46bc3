use ndarray::prelude::*;
use tracing::trace;

use crate::error::{AppError, AppResult};

/// Check that `similarity` is an `items x items` matrix of finite values.
pub fn validate_similarity(items: usize, similarity: &Array2<f64>) -> AppResult<()> {
    let (rows, cols) = similarity.dim();
    if rows != items || cols != items {
        return Err(AppError::ShapeMismatch { rows, cols, items });
    }
    if let Some(((row, col), _)) = similarity.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(AppError::NonFiniteSimilarity { row, col });
    }
    Ok(())
}

/// Strength of association regardless of sign: `|m[i][j]|` element-wise.
pub fn preprocess(similarity: &Array2<f64>) -> Array2<f64> {
    trace!("Taking absolute similarities of {:?} matrix", similarity.dim());
    similarity.mapv(f64::abs)
}

/// Build a matrix from nested rows (e.g. parsed JSON), rejecting ragged input.
pub fn similarity_from_rows(rows: Vec<Vec<f64>>) -> AppResult<Array2<f64>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    let mut flat = Vec::with_capacity(n_rows * n_cols);
    for (row, values) in rows.into_iter().enumerate() {
        if values.len() != n_cols {
            return Err(AppError::RaggedMatrix {
                row,
                expected: n_cols,
                found: values.len(),
            });
        }
        flat.extend(values);
    }
    Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| AppError::Other(e.to_string()))
}
