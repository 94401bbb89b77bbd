//! Error types for the `ragstore` crate.

use thiserror::Error;

/// Errors that can occur in chunking, embedding, and retrieval operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A document could not be segmented under the configured constraints.
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// A chunking strategy requires an embedder capability that is not provided.
    #[error("Capability error: strategy '{strategy}' requires {requirement}")]
    Capability {
        /// The strategy that was being configured.
        strategy: &'static str,
        /// The missing embedder capability.
        requirement: &'static str,
    },

    /// An embedding's dimensionality disagrees with the collection's.
    #[error("Dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality established for the collection.
        expected: usize,
        /// The dimensionality of the offending embedding.
        actual: usize,
    },

    /// An operation referenced an id that does not exist in the collection.
    #[error("Not found: id '{id}'")]
    NotFound {
        /// The unknown id.
        id: String,
    },

    /// The underlying persistence is unreachable or its data is corrupt.
    #[error("Store unavailable ({backend}): {message}")]
    StoreUnavailable {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    Store {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A batch operation was called with inconsistent argument shapes.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error in the retrieval pipeline orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Some chunks of a document failed to embed during ingestion.
    ///
    /// Nothing from the document is stored; `failed` identifies exactly
    /// which chunks need to be retried.
    #[error("Embedding failed for {} of {total} chunks of document '{document_id}'", failed.len())]
    PartialEmbedding {
        /// The document whose ingestion was aborted.
        document_id: String,
        /// Total number of chunks produced for the document.
        total: usize,
        /// The chunks that failed to embed.
        failed: Vec<FailedChunk>,
    },
}

/// Identifies one chunk that failed to embed during ingestion.
#[derive(Debug, Clone)]
pub struct FailedChunk {
    /// Position of the chunk within the document's chunk sequence.
    pub index: usize,
    /// The chunk's id.
    pub id: String,
    /// The embedder's error message for this chunk.
    pub message: String,
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
