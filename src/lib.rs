//! Deterministic clustering of short texts (e.g. questionnaire items) from a
//! precomputed similarity matrix.
//!
//! Identical inputs always give identical clusters, centroids and
//! representative texts, in identical order.
//!
//! ```rust
//! use ndarray::array;
//! use qcluster::{Question, assign_clusters};
//!
//! let questions: Vec<Question> = ["A", "B", "C", "D"].into_iter().map(Question::new).collect();
//! let similarity = array![
//!     [1.0, 0.9, 0.1, 0.0],
//!     [0.9, 1.0, 0.1, 0.1],
//!     [0.1, 0.1, 1.0, 0.8],
//!     [0.0, 0.1, 0.8, 1.0],
//! ];
//! let clusters = assign_clusters(&questions, &similarity, 2).unwrap();
//! assert_eq!(clusters[0].item_ids, vec![0, 1]);
//! assert_eq!(clusters[1].centroid_id, 2);
//! ```

#![forbid(unsafe_code)]

pub mod classify;
pub mod error;
pub mod io_utils;
pub mod question;

pub use classify::{
    Classifier, ClusterAssignment, ClusterParams, Embedder, NoEmbedder, QuestionCluster,
    assign_clusters,
};
pub use error::{AppError, AppResult};
pub use question::Question;
