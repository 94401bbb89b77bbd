//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// Late chunking additionally needs per-unit contextualized vectors. A
/// backend that can produce them overrides
/// [`supports_unit_embeddings`](EmbeddingProvider::supports_unit_embeddings)
/// and [`embed_units`](EmbeddingProvider::embed_units); the defaults declare
/// the capability absent, which makes [`LateChunker`](crate::LateChunker)
/// construction fail up front rather than at call time.
///
/// # Example
///
/// ```rust,ignore
/// use ragstore::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input, preserving input order. Override this
    /// method if the backend supports native batch embedding.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Whether [`embed_units`](EmbeddingProvider::embed_units) is available.
    fn supports_unit_embeddings(&self) -> bool {
        false
    }

    /// Generate one contextualized vector per unit, with the whole document
    /// visible to the model.
    ///
    /// `units` are the document's atomic spans in order; their concatenation
    /// is `document`. The returned vectors are aligned one-to-one with
    /// `units` and, unlike [`embed`](EmbeddingProvider::embed) on each unit
    /// in isolation, may depend on the surrounding document.
    async fn embed_units(&self, document: &str, units: &[&str]) -> Result<Vec<Vec<f32>>> {
        let _ = (document, units);
        Err(RagError::Capability {
            strategy: "late",
            requirement: "per-unit contextualized embeddings (embed_units)",
        })
    }
}
