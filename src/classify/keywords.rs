use tracing::debug;

use super::convert::embeddings_to_ndarray;
use super::linalg::cosine_to_mean;
use super::traits::Embedder;
use crate::AppResult;

/// Pick up to `top_k` of `texts` that sit closest to the cluster's mean embedding.
///
/// Texts are ranked by cosine similarity to the mean of their own embeddings,
/// most similar first, with ties going to the earlier text. Nothing is sent to
/// the embedder when `texts` is empty or `top_k` is zero.
#[tracing::instrument(
    name = "Selecting representative questions",
    level = "debug",
    skip(embedder, texts),
    fields(n_texts = texts.len())
)]
pub async fn representative_texts<E: Embedder + ?Sized>(
    embedder: &E,
    texts: &[String],
    top_k: usize,
) -> AppResult<Vec<String>> {
    if texts.is_empty() || top_k == 0 {
        return Ok(Vec::new());
    }

    let embeddings = embedder.embed(texts).await?;
    let arr = embeddings_to_ndarray(&embeddings, texts.len())?;
    let similarities = cosine_to_mean(&arr);

    let mut order: Vec<usize> = (0..texts.len()).collect();
    order.sort_by(|&a, &b| similarities[b].total_cmp(&similarities[a]).then(a.cmp(&b)));
    order.truncate(top_k);
    debug!("Representative positions: {:?}", order);

    Ok(order.into_iter().map(|idx| texts[idx].clone()).collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;
    use futures::future::BoxFuture;

    use super::*;
    use crate::AppError;

    /// Embedder returning fixed vectors per text and counting calls.
    #[derive(Default)]
    pub(crate) struct TableEmbedder {
        pub(crate) table: HashMap<String, Vec<f32>>,
        pub(crate) calls: AtomicUsize,
    }

    impl TableEmbedder {
        pub(crate) fn new<const N: usize>(rows: [(&str, Vec<f32>); N]) -> Self {
            Self {
                table: rows.into_iter().map(|(t, v)| (t.to_string(), v)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Embedder for TableEmbedder {
        fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, AppResult<Vec<Vec<f32>>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async move {
                texts
                    .iter()
                    .map(|t| {
                        self.table
                            .get(t)
                            .cloned()
                            .ok_or_else(|| AppError::Other(format!("no vector for {t}")))
                    })
                    .collect()
            }
            .boxed()
        }
    }

    fn strings(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn picks_texts_nearest_the_mean() {
        let embedder = TableEmbedder::new([
            ("left", vec![1.0, 0.0]),
            ("middle", vec![1.0, 1.0]),
            ("right", vec![0.0, 1.0]),
            ("far", vec![-1.0, 0.2]),
        ]);
        let texts = strings(&["left", "middle", "right", "far"]);
        let reps = representative_texts(&embedder, &texts, 2).await.unwrap();
        assert_eq!(reps, strings(&["middle", "right"]));
    }

    #[tokio::test]
    async fn returns_every_member_once_when_top_k_exceeds_size() {
        let embedder = TableEmbedder::new([("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])]);
        let texts = strings(&["a", "b"]);
        let reps = representative_texts(&embedder, &texts, 5).await.unwrap();
        assert_eq!(reps.len(), 2);
        // both are equally far from the mean, so order falls back to position
        assert_eq!(reps, strings(&["a", "b"]));
    }

    #[tokio::test]
    async fn empty_cluster_never_calls_the_embedder() {
        let embedder = TableEmbedder::default();
        let reps = representative_texts(&embedder, &[], 5).await.unwrap();
        assert!(reps.is_empty());
        let reps = representative_texts(&embedder, &strings(&["x"]), 0).await.unwrap();
        assert!(reps.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_errors_are_surfaced() {
        let embedder = TableEmbedder::new([("known", vec![1.0])]);
        let err = representative_texts(&embedder, &strings(&["known", "unknown"]), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Other(msg) if msg.contains("unknown")));
    }

    #[tokio::test]
    async fn malformed_provider_output_is_rejected() {
        let embedder = TableEmbedder::new([("a", vec![1.0, 0.0]), ("b", vec![1.0])]);
        let err = representative_texts(&embedder, &strings(&["a", "b"]), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmbeddingDimension { index: 1, .. }));
    }
}
