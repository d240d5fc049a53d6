//! Embedder trait for text-to-vector conversion.
//!
//! Defines the interface for embedding email text into vectors for
//! nearest-neighbour retrieval. Implementations (e.g., the OpenAI embeddings
//! API) live in mailrag-infra.

use std::future::Future;

use mailrag_types::error::UpstreamError;

/// Trait for converting text into embedding vectors.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait Embedder: Send + Sync {
    /// Embed one or more texts into vectors.
    ///
    /// Returns one vector per input text, in input order. Every vector has
    /// exactly [`Self::dimension`] components.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, UpstreamError>> + Send;

    /// Embed a single text.
    fn embed_one(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, UpstreamError>> + Send {
        let texts = vec![text.to_string()];
        async move {
            let mut vectors = self.embed(&texts).await?;
            vectors.pop().ok_or_else(|| {
                UpstreamError::MalformedResponse("embedding response contained no vectors".to_string())
            })
        }
    }

    /// The model name used for embeddings (e.g., "text-embedding-3-large").
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}
