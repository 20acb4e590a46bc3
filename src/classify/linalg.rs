use ndarray::prelude::*;
use ndarray::{OwnedRepr, RemoveAxis, Zip};

/// Euclidean norm of every row.
pub fn row_norms<D>(x: &ArrayBase<OwnedRepr<f64>, D>) -> ArrayBase<OwnedRepr<f64>, D::Smaller>
where
    D: Dimension + RemoveAxis,
{
    let prod: ArrayBase<OwnedRepr<f64>, D> = x * x;
    prod.sum_axis(Axis(1)).sqrt()
}

/// Cosine similarity of every row of `x` to the mean row.
///
/// A zero-norm row, or a zero mean, scores 0.0.
pub fn cosine_to_mean(x: &Array2<f64>) -> Array1<f64> {
    let Some(mean) = x.mean_axis(Axis(0)) else {
        return Array1::zeros(0);
    };
    let mean_norm = mean.dot(&mean).sqrt();
    let norms = row_norms(x);
    let dots = x.dot(&mean);
    Zip::from(&dots).and(&norms).map_collect(|&dot, &norm| {
        let denom = norm * mean_norm;
        if denom > 0.0 { dot / denom } else { 0.0 }
    })
}
