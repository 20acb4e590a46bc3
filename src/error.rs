use thiserror::Error;

/// Unified error type for the clustering pipeline and its command-line front end.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid cluster count {requested}. At least one cluster must be requested.")]
    InvalidClusterCount { requested: usize },
    #[error("Similarity matrix is {rows}x{cols} but there are {items} items.")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        items: usize,
    },
    #[error("Similarity matrix row {row} has {found} entries, expected {expected}.")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Similarity matrix entry ({row}, {col}) is not a finite number.")]
    NonFiniteSimilarity { row: usize, col: usize },
    #[error("Embedding provider returned {found} vectors for {expected} texts.")]
    EmbeddingCount { expected: usize, found: usize },
    #[error("Embedding {index} has dimension {found}, expected {expected}.")]
    EmbeddingDimension {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("Errored while handling a file. {0}")]
    Io(#[from] std::io::Error),
    #[error("Error serializing json. {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Error parsing json input. {0}")]
    JsonPath(#[from] serde_path_to_error::Error<serde_json::Error>),
    #[error("Error communicating with the embedding server. {0}")]
    AIClient(#[from] async_openai::error::OpenAIError),
    #[cfg(feature = "local-ml")]
    #[error("Error while running a local ML model. {0}")]
    Embedder(#[from] qcluster_local_embedder::EmbedderError),
    #[error("{0}")]
    Other(String),
}

/// Convenience alias for results that bubble `AppError`.
pub type AppResult<T> = Result<T, AppError>;
