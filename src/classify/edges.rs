use std::cmp::Ordering;

use ndarray::prelude::*;
use tracing::debug;

/// Undirected pair of distinct items, `source < target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

impl Edge {
    /// Total order used for ranking: heaviest first, then by `(source, target)`.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .weight
            .total_cmp(&self.weight)
            .then(self.source.cmp(&other.source))
            .then(self.target.cmp(&other.target))
    }
}

/// Enumerate every unordered off-diagonal pair of a preprocessed (non-negative)
/// matrix and sort the pairs strongest first.
///
/// An asymmetric matrix contributes the larger of its two directions. Ties are
/// broken by `(source, target)` ascending so the order never depends on
/// platform or hashing.
#[tracing::instrument(name = "Ranking item pairs", level = "debug", skip(weights))]
pub fn rank_edges(weights: &Array2<f64>) -> Vec<Edge> {
    let n = weights.nrows().min(weights.ncols());
    let mut edges = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for source in 0..n {
        for target in (source + 1)..n {
            let weight = weights[[source, target]].max(weights[[target, source]]);
            edges.push(Edge {
                source,
                target,
                weight,
            });
        }
    }
    edges.sort_unstable_by(Edge::rank_cmp);
    debug!("Ranked {} candidate edges", edges.len());
    edges
}
