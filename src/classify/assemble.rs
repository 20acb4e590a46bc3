use serde::Serialize;

use super::merge::MergeOutcome;
use super::union_find::DisjointSet;

/// Membership and centroid of one cluster, before any embedding work.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    pub cluster_id: usize,
    pub centroid_id: usize,
    /// Member indices in ascending order.
    pub item_ids: Vec<usize>,
}

/// List the groups of `groups`, numbered by their smallest member.
///
/// Walking items in index order means the first time a root is seen is at its
/// smallest member, so discovery order is already the required cluster order.
pub fn assemble_groups(groups: &mut DisjointSet) -> Vec<Vec<usize>> {
    let mut cluster_of_root: Vec<Option<usize>> = vec![None; groups.len()];
    let mut clusters: Vec<Vec<usize>> = Vec::with_capacity(groups.component_count());
    for item in 0..groups.len() {
        let root = groups.find(item);
        let cluster = *cluster_of_root[root].get_or_insert_with(|| {
            clusters.push(Vec::new());
            clusters.len() - 1
        });
        clusters[cluster].push(item);
    }
    clusters
}

/// Member with the highest centrality score; ties go to the smallest index.
pub fn select_centroid(members: &[usize], scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for &id in members {
        match best {
            Some(b) if scores[id] > scores[b] || (scores[id] == scores[b] && id < b) => {
                best = Some(id)
            }
            None => best = Some(id),
            _ => {}
        }
    }
    best
}

/// Turn a finished merge into numbered clusters with their centroids.
pub fn assemble(outcome: &mut MergeOutcome) -> Vec<ClusterAssignment> {
    assemble_groups(&mut outcome.groups)
        .into_iter()
        .enumerate()
        .filter_map(|(cluster_id, item_ids)| {
            select_centroid(&item_ids, &outcome.scores).map(|centroid_id| ClusterAssignment {
                cluster_id,
                centroid_id,
                item_ids,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clusters_are_numbered_by_smallest_member() {
        let mut ds = DisjointSet::new(6);
        ds.union(5, 3);
        ds.union(4, 1);
        ds.union(2, 0);
        ds.union(3, 4);
        assert_eq!(assemble_groups(&mut ds), vec![vec![0, 2], vec![1, 3, 4, 5]]);
    }

    #[test]
    fn singletons_keep_index_order() {
        let mut ds = DisjointSet::new(3);
        assert_eq!(assemble_groups(&mut ds), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn centroid_is_highest_score() {
        let scores = [0.1, 2.0, 0.5, 2.5];
        assert_eq!(select_centroid(&[0, 1, 2], &scores), Some(1));
        assert_eq!(select_centroid(&[0, 1, 2, 3], &scores), Some(3));
    }

    #[test]
    fn centroid_ties_go_to_smallest_index() {
        let scores = [0.0, 0.7, 0.0, 0.7];
        assert_eq!(select_centroid(&[3, 1], &scores), Some(1));
        assert_eq!(select_centroid(&[2, 0], &scores), Some(0));
    }

    #[test]
    fn empty_members_have_no_centroid() {
        assert_eq!(select_centroid(&[], &[]), None);
    }
}
