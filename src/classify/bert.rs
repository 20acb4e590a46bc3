use futures::FutureExt;
use futures::future::BoxFuture;
use qcluster_local_embedder::BertEmbedder as LocalBertEmbedder;

use crate::AppResult;
use crate::classify::traits::Embedder;

/// In-process sentence embedder; load once and share.
#[derive(Clone)]
pub struct BertEmbedder {
    inner: LocalBertEmbedder,
}

impl Embedder for BertEmbedder {
    fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, AppResult<Vec<Vec<f32>>>> {
        async move { Ok(self.inner.embed_texts(texts).await?) }.boxed()
    }
}

impl BertEmbedder {
    #[tracing::instrument(name = "Loading local embedding model", level = "info")]
    pub async fn new_from_pretrained<S: AsRef<str> + std::fmt::Debug>(
        model_name: S,
    ) -> AppResult<Self> {
        let inner = LocalBertEmbedder::new_from_pretrained(model_name).await?;
        Ok(Self { inner })
    }

    pub fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}
