use async_openai::types::CreateEmbeddingRequestArgs;
use async_openai::{Client, config::Config};
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::debug;

use crate::AppResult;
use crate::classify::traits::Embedder;

/// Embedding implementation backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OAIEmbedder<C: Config> {
    client: Client<C>,
    model: String,
}

impl<C: Config> OAIEmbedder<C> {
    pub fn new(client: Client<C>, model: String) -> Self {
        Self { client, model }
    }
}

impl<C: Config + Send + Sync> Embedder for OAIEmbedder<C> {
    fn embed<'e>(&'e self, texts: &'e [String]) -> BoxFuture<'e, AppResult<Vec<Vec<f32>>>> {
        async move {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(texts.to_vec())
                .build()?;

            let response = self.client.embeddings().create(request).await?;
            debug!(
                "Embedding server returned {} vectors for {} texts",
                response.data.len(),
                texts.len()
            );

            // Servers are not required to answer in request order.
            let mut data = response.data;
            data.sort_by_key(|d| d.index);
            Ok(data.into_iter().map(|d| d.embedding).collect())
        }
        .boxed()
    }
}
