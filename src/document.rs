//! Data types for documents, chunks, and query results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Open key-value metadata attached to documents and chunks.
pub type Metadata = HashMap<String, String>;

/// A source document containing text content and metadata.
///
/// Immutable input to chunking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata associated with the document.
    pub metadata: Metadata,
    /// Optional URI pointing to the original source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document with the given id and text and empty metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: Metadata::new(),
            source_uri: None,
        }
    }
}

/// A retrievable unit of document text with its vector embedding.
///
/// Chunkers emit chunks with provenance metadata (`document_id`,
/// `chunk_index`, `strategy`); the embedding is empty until computed,
/// except for late chunking, which attaches pooled vectors itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk within its collection.
    pub id: String,
    /// The text content of the chunk. Never empty.
    pub text: String,
    /// The vector embedding for this chunk. Empty until computed.
    pub embedding: Vec<f32>,
    /// Key-value metadata inherited from the parent document plus
    /// chunk-specific fields.
    pub metadata: Metadata,
}

/// One ranked result of a vector store query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMatch {
    /// The matched chunk's id.
    pub id: String,
    /// The matched chunk's text.
    pub text: String,
    /// The matched chunk's metadata.
    pub metadata: Metadata,
    /// Cosine distance to the query embedding (lower is nearer).
    pub distance: f32,
}
