//! Document chunking and retrieval for RAG pipelines.
//!
//! `ragstore` turns raw documents into retrievable chunks, embeds them, and
//! persists them in a collection-scoped vector store for similarity search.
//! The pieces compose but stand alone:
//!
//! - [`Chunker`] strategies decide chunk boundaries:
//!   [`ContextAwareChunker`] follows semantic similarity between adjacent
//!   units, [`LateChunker`] embeds the whole document first and pools
//!   per-unit contextualized vectors per chunk.
//! - [`VectorStore`] stores chunks by named collection and ranks them by
//!   cosine distance, with an in-memory and a file-backed implementation.
//! - [`RagPipeline`] wires a chunker, an [`EmbeddingProvider`], and a store
//!   into the ingest and query paths.
//!
//! The embedding model itself is a collaborator behind the
//! [`EmbeddingProvider`] trait; an OpenAI-compatible HTTP provider is
//! available behind the `openai` feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragstore::{
//!     ChunkingConfig, ChunkingStrategy, Document, PersistentVectorStore, RagPipeline,
//! };
//!
//! let store = Arc::new(PersistentVectorStore::open("./chunk_db", "document_chunks")?);
//! let chunker = ChunkingStrategy::ContextAware
//!     .build(embedder.clone(), ChunkingConfig::default())?;
//! let pipeline = RagPipeline::builder()
//!     .embedding_provider(embedder)
//!     .vector_store(store)
//!     .chunker(chunker)
//!     .build()?;
//!
//! pipeline.ingest(&Document::new("doc_1", "...")).await?;
//! let matches = pipeline.retrieve("capital of France", 5).await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
#[cfg(feature = "openai")]
pub mod openai;
pub mod persistent;
pub mod pipeline;
pub mod vectorstore;

pub use chunking::{Chunker, ChunkingStrategy, ContextAwareChunker, LateChunker};
pub use config::{ChunkingConfig, ChunkingConfigBuilder};
pub use document::{Chunk, Document, Metadata, QueryMatch};
pub use embedding::EmbeddingProvider;
pub use error::{FailedChunk, RagError, Result};
pub use inmemory::{DEFAULT_COLLECTION, InMemoryVectorStore};
#[cfg(feature = "openai")]
pub use openai::OpenAiEmbeddingProvider;
pub use persistent::PersistentVectorStore;
pub use pipeline::{IngestReport, RagPipeline, RagPipelineBuilder};
pub use vectorstore::{QueryFilter, VectorStore};
