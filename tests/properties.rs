use ndarray::Array2;
use proptest::prelude::*;
use qcluster::Question;
use qcluster::assign_clusters;
use qcluster::classify::edges::rank_edges;
use qcluster::classify::merge::greedy_merge;
use qcluster::classify::similarity::preprocess;

/// A symmetric similarity matrix in [-1, 1] with a unit diagonal.
fn similarity_matrix() -> impl Strategy<Value = Array2<f64>> {
    (1usize..12).prop_flat_map(|n| {
        prop::collection::vec(-1.0f64..=1.0, n * n).prop_map(move |vals| {
            let mut m = Array2::from_shape_vec((n, n), vals).unwrap();
            for i in 0..n {
                m[[i, i]] = 1.0;
                for j in 0..i {
                    m[[i, j]] = m[[j, i]];
                }
            }
            m
        })
    })
}

fn questions(n: usize) -> Vec<Question> {
    (0..n).map(|i| Question::new(format!("question {i}"))).collect()
}

proptest! {
    #[test]
    fn prop_every_item_in_exactly_one_cluster(m in similarity_matrix(), k in 1usize..15) {
        let n = m.nrows();
        let clusters = assign_clusters(&questions(n), &m, k).unwrap();

        let mut seen = vec![0usize; n];
        for c in &clusters {
            for &id in &c.item_ids {
                seen[id] += 1;
            }
        }
        prop_assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn prop_cluster_count_is_bounded(m in similarity_matrix(), k in 1usize..15) {
        let n = m.nrows();
        let clusters = assign_clusters(&questions(n), &m, k).unwrap();
        prop_assert_eq!(clusters.len(), k.min(n));
        for (i, c) in clusters.iter().enumerate() {
            prop_assert_eq!(c.cluster_id, i);
        }
    }

    #[test]
    fn prop_identical_inputs_give_identical_output(m in similarity_matrix(), k in 1usize..15) {
        let qs = questions(m.nrows());
        let first = assign_clusters(&qs, &m, k).unwrap();
        let second = assign_clusters(&qs, &m.clone(), k).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_centroid_is_a_top_scoring_member(m in similarity_matrix(), k in 1usize..15) {
        let n = m.nrows();
        let clusters = assign_clusters(&questions(n), &m, k).unwrap();
        let outcome = greedy_merge(n, &rank_edges(&preprocess(&m)), k);
        for c in &clusters {
            prop_assert!(c.item_ids.contains(&c.centroid_id));
            let best = outcome.scores[c.centroid_id];
            for &id in &c.item_ids {
                prop_assert!(outcome.scores[id] <= best);
            }
        }
    }

    #[test]
    fn prop_accepted_edges_never_increase(m in similarity_matrix(), k in 1usize..15) {
        let outcome = greedy_merge(m.nrows(), &rank_edges(&preprocess(&m)), k);
        for pair in outcome.accepted.windows(2) {
            prop_assert!(pair[0].weight >= pair[1].weight);
        }
    }

    #[test]
    fn prop_clusters_are_ordered_by_smallest_member(m in similarity_matrix(), k in 1usize..15) {
        let clusters = assign_clusters(&questions(m.nrows()), &m, k).unwrap();
        let firsts: Vec<usize> = clusters.iter().map(|c| c.item_ids[0]).collect();
        prop_assert!(firsts.windows(2).all(|w| w[0] < w[1]));
    }
}
