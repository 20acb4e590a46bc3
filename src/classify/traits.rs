use futures::FutureExt;
use futures::future::BoxFuture;

use crate::{AppError, AppResult};

/// Trait for converting text into vector embeddings.
///
/// Implementations are constructed once by the caller and shared across runs;
/// every call must return one vector per input text, all of the same length.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts.
    /// Returns a vector of embeddings, where each embedding is a vector of floats.
    fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, AppResult<Vec<Vec<f32>>>>;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, AppResult<Vec<Vec<f32>>>> {
        (**self).embed(texts)
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, AppResult<Vec<Vec<f32>>>> {
        (**self).embed(texts)
    }
}

/// Placeholder for runs that skip representative texts. Any call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEmbedder;

impl Embedder for NoEmbedder {
    fn embed<'a>(&'a self, _texts: &'a [String]) -> BoxFuture<'a, AppResult<Vec<Vec<f32>>>> {
        async { Err(AppError::Other("no embedding provider configured".to_string())) }.boxed()
    }
}
