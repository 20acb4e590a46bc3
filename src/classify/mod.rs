//! Deterministic grouping of questions from a precomputed similarity matrix.
//!
//! The pipeline is fixed: absolute similarities are ranked strongest first,
//! items are merged single-linkage style until the requested number of groups
//! remains, and each group's centroid is the member that collected the most
//! edge weight while merging. Representative texts come from an injected
//! [`Embedder`].

pub mod assemble;
#[cfg(feature = "local-ml")]
pub mod bert;
pub(crate) mod convert;
pub mod edges;
pub mod keywords;
pub(crate) mod linalg;
pub mod merge;
pub mod openai;
pub mod similarity;
pub mod traits;
pub mod union_find;

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;
use tracing_indicatif::style::ProgressStyle;

use crate::AppResult;
use crate::error::AppError;
use crate::question::Question;

pub use assemble::ClusterAssignment;
pub use traits::{Embedder, NoEmbedder};

/// Number of clusters requested when the caller does not say.
pub const DEFAULT_NUM_CLUSTERS: usize = 5;
/// Number of representative texts kept per cluster when the caller does not say.
pub const DEFAULT_TOP_K: usize = 5;

/// Knobs for a clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterParams {
    pub num_clusters: usize,
    pub top_k: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            num_clusters: DEFAULT_NUM_CLUSTERS,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// A finished cluster of questions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QuestionCluster {
    pub cluster_id: usize,
    pub centroid_id: usize,
    pub centroid: Question,
    pub items: Vec<Question>,
    pub item_ids: Vec<usize>,
    pub text_description: String,
    pub keywords: Vec<String>,
}

/// Partition `questions` into at most `num_clusters` groups and pick each group's centroid.
///
/// Fails on a zero cluster count, on a matrix that is not `n x n`, and on any
/// non-finite similarity. No questions means no clusters.
#[tracing::instrument(
    name = "Clustering questions",
    level = "info",
    skip(questions, similarity),
    fields(n_items = questions.len())
)]
pub fn assign_clusters(
    questions: &[Question],
    similarity: &Array2<f64>,
    num_clusters: usize,
) -> AppResult<Vec<ClusterAssignment>> {
    if num_clusters == 0 {
        return Err(AppError::InvalidClusterCount {
            requested: num_clusters,
        });
    }
    similarity::validate_similarity(questions.len(), similarity)?;
    if questions.is_empty() {
        return Ok(Vec::new());
    }

    let weights = similarity::preprocess(similarity);
    let ranked = edges::rank_edges(&weights);
    let mut outcome = merge::greedy_merge(questions.len(), &ranked, num_clusters);
    let clusters = assemble::assemble(&mut outcome);
    debug!("Formed {} clusters", clusters.len());
    Ok(clusters)
}

/// Clusters questions and labels each cluster with representative texts.
pub struct Classifier<E> {
    embedder: E,
    params: ClusterParams,
}

impl<E: Embedder> Classifier<E> {
    pub fn new(embedder: E, params: ClusterParams) -> Self {
        Self { embedder, params }
    }

    /// Run the full pipeline. Any embedder failure fails the whole call.
    pub async fn classify(
        &self,
        questions: &[Question],
        similarity: &Array2<f64>,
    ) -> AppResult<Vec<QuestionCluster>> {
        let assignments = assign_clusters(questions, similarity, self.params.num_clusters)?;
        build_cluster_output(&self.embedder, questions, assignments, self.params.top_k).await
    }
}

#[tracing::instrument(
    name = "Describing question clusters",
    level = "info",
    skip(embedder, questions, assignments)
)]
async fn build_cluster_output<E: Embedder>(
    embedder: &E,
    questions: &[Question],
    assignments: Vec<ClusterAssignment>,
    top_k: usize,
) -> AppResult<Vec<QuestionCluster>> {
    let header_span = info_span!("Describing clusters...");
    header_span.pb_set_message("Describing...");
    header_span.pb_set_finish_message("Clusters described");
    header_span.pb_set_length(assignments.len() as u64);
    header_span.pb_set_style(
        &ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let _enter = header_span.enter();

    let mut clusters = Vec::with_capacity(assignments.len());
    for ClusterAssignment {
        cluster_id,
        centroid_id,
        item_ids,
    } in assignments
    {
        let items: Vec<Question> = item_ids.iter().map(|&id| questions[id].clone()).collect();
        let texts: Vec<String> = items.iter().map(|q| q.question_text.clone()).collect();
        let keywords = keywords::representative_texts(embedder, &texts, top_k).await?;
        let centroid = questions[centroid_id].clone();

        clusters.push(QuestionCluster {
            cluster_id,
            centroid_id,
            text_description: centroid.question_text.clone(),
            centroid,
            items,
            item_ids,
            keywords,
        });
        header_span.pb_inc(1);
    }

    info!("Described {} clusters", clusters.len());
    Ok(clusters)
}
