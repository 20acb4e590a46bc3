use tracing::{debug, trace};

use super::edges::Edge;
use super::union_find::DisjointSet;

/// Grouping and per-item centrality produced by [`greedy_merge`].
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub groups: DisjointSet,
    /// Sum of the weights of every accepted edge touching each item.
    pub scores: Vec<f64>,
    /// Accepted edges, in acceptance order.
    pub accepted: Vec<Edge>,
}

/// Single-linkage merge that stops at a target group count.
///
/// Edges are consumed in the order given. Before each edge the number of
/// groups is compared with `num_clusters`; once it is no larger, no further
/// edge is looked at. Otherwise the edge is accepted: its endpoints' groups are
/// joined and its weight is credited to both endpoints, including when they
/// were already in the same group.
#[tracing::instrument(name = "Merging items into groups", level = "debug", skip(ranked))]
pub fn greedy_merge(n: usize, ranked: &[Edge], num_clusters: usize) -> MergeOutcome {
    let mut groups = DisjointSet::new(n);
    let mut scores = vec![0.0; n];
    let mut accepted = Vec::new();

    for edge in ranked {
        if groups.component_count() <= num_clusters {
            break;
        }
        let joined = groups.union(edge.source, edge.target);
        trace!(
            source = edge.source,
            target = edge.target,
            weight = edge.weight,
            joined,
            "Accepted edge"
        );
        scores[edge.source] += edge.weight;
        scores[edge.target] += edge.weight;
        accepted.push(*edge);
    }

    debug!(
        "Accepted {} of {} edges, {} groups remain",
        accepted.len(),
        ranked.len(),
        groups.component_count()
    );
    MergeOutcome {
        groups,
        scores,
        accepted,
    }
}
