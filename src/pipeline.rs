//! Retrieval pipeline orchestrator.
//!
//! The [`RagPipeline`] composes an [`EmbeddingProvider`], a [`VectorStore`],
//! and a [`Chunker`] into the ingestion path (chunk → embed → store) and the
//! query path (embed query → similarity search → ranked chunks). It holds no
//! state of its own beyond the collaborators it is constructed with.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragstore::{RagPipeline, ChunkingStrategy, ChunkingConfig, InMemoryVectorStore};
//!
//! let chunker = ChunkingStrategy::ContextAware
//!     .build(embedder.clone(), ChunkingConfig::default())?;
//! let pipeline = RagPipeline::builder()
//!     .embedding_provider(embedder)
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chunker(chunker)
//!     .build()?;
//!
//! pipeline.ingest(&document).await?;
//! let matches = pipeline.retrieve("search query", 5).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::document::{Document, QueryMatch};
use crate::embedding::EmbeddingProvider;
use crate::error::{FailedChunk, RagError, Result};
use crate::vectorstore::VectorStore;

/// The retrieval pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`]. All collaborators are
/// explicit, passed-in dependencies; multiple pipelines with different
/// providers or stores can coexist.
pub struct RagPipeline {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline").finish_non_exhaustive()
    }
}

/// Outcome of [`RagPipeline::ingest_batch`]: per-document successes and
/// failures, so callers can retry exactly the documents that failed.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Document id → ids of the chunks stored for it.
    pub succeeded: Vec<(String, Vec<String>)>,
    /// Document id → the error that aborted its ingestion.
    pub failed: Vec<(String, RagError)>,
}

impl IngestReport {
    /// Whether every document was ingested.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Ingest a single document: chunk → embed → store.
    ///
    /// Chunks that already carry embeddings (late chunking) are stored
    /// as-is; the rest are embedded by chunk text, in chunk order. The
    /// chunker-assigned ids are passed to the store as explicit ids.
    /// Returns the stored ids.
    ///
    /// # Errors
    ///
    /// Chunking errors propagate unchanged. Embedding failures abort the
    /// document without storing anything and surface as
    /// [`RagError::PartialEmbedding`], naming each chunk that failed so the
    /// caller can retry just those. Store failures surface as
    /// [`RagError::Pipeline`] with the document id.
    pub async fn ingest(&self, document: &Document) -> Result<Vec<String>> {
        let mut chunks = self.chunker.chunk(document).await?;
        let total = chunks.len();

        let mut failed = Vec::new();
        for (index, chunk) in chunks.iter_mut().enumerate() {
            if !chunk.embedding.is_empty() {
                continue;
            }
            match self.embedding_provider.embed(&chunk.text).await {
                Ok(embedding) => chunk.embedding = embedding,
                Err(e) => failed.push(FailedChunk {
                    index,
                    id: chunk.id.clone(),
                    message: e.to_string(),
                }),
            }
        }
        if !failed.is_empty() {
            error!(
                document.id = %document.id,
                failed = failed.len(),
                total,
                "embedding failed during ingestion"
            );
            return Err(RagError::PartialEmbedding {
                document_id: document.id.clone(),
                total,
                failed,
            });
        }

        let mut texts = Vec::with_capacity(total);
        let mut embeddings = Vec::with_capacity(total);
        let mut metadatas = Vec::with_capacity(total);
        let mut ids = Vec::with_capacity(total);
        for chunk in chunks {
            texts.push(chunk.text);
            embeddings.push(chunk.embedding);
            metadatas.push(chunk.metadata);
            ids.push(chunk.id);
        }

        let stored = self
            .vector_store
            .add(texts, embeddings, Some(metadatas), Some(ids))
            .await
            .map_err(|e| {
                error!(document.id = %document.id, error = %e, "store add failed during ingestion");
                RagError::Pipeline(format!("add failed for document '{}': {e}", document.id))
            })?;

        info!(document.id = %document.id, chunk_count = stored.len(), "ingested document");
        Ok(stored)
    }

    /// Ingest multiple documents, continuing past per-document failures.
    ///
    /// A failing document aborts only its own ingestion; the report pairs
    /// each document id with its stored chunk ids or its error.
    pub async fn ingest_batch(&self, documents: &[Document]) -> IngestReport {
        let mut report = IngestReport::default();
        for document in documents {
            match self.ingest(document).await {
                Ok(ids) => report.succeeded.push((document.id.clone(), ids)),
                Err(e) => report.failed.push((document.id.clone(), e)),
            }
        }
        report
    }

    /// Query the pipeline: embed the query text, then search the store.
    ///
    /// Returns up to `k` matches, nearest first (ascending cosine distance).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Pipeline`] if embedding or the store query fails.
    pub async fn retrieve(&self, query_text: &str, k: usize) -> Result<Vec<QueryMatch>> {
        let query_embedding = self
            .embedding_provider
            .embed(query_text)
            .await
            .map_err(|e| {
                error!(error = %e, "embedding failed during query");
                RagError::Pipeline(format!("query embedding failed: {e}"))
            })?;

        let matches = self
            .vector_store
            .query(&query_embedding, k, None)
            .await
            .map_err(|e| {
                error!(error = %e, "vector store query failed");
                RagError::Pipeline(format!("query failed: {e}"))
            })?;

        info!(result_count = matches.len(), "query completed");
        Ok(matches)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// All fields are required. Call [`build()`](RagPipelineBuilder::build) to
/// validate and produce the pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker (usually built via
    /// [`ChunkingStrategy::build`](crate::ChunkingStrategy::build)).
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chunker = self
            .chunker
            .ok_or_else(|| RagError::Config("chunker is required".to_string()))?;

        Ok(RagPipeline {
            embedding_provider,
            vector_store,
            chunker,
        })
    }
}
