//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`ContextAwareChunker`] — boundaries follow semantic similarity
//!   between adjacent units, so chunks align with topic shifts
//! - [`LateChunker`] — the whole document is embedded first and chunk
//!   vectors are pooled from per-unit contextualized embeddings, so each
//!   chunk's vector retains long-range document context
//!
//! Both strategies segment documents into atomic units (sentences, also cut
//! at blank lines). Each unit keeps its trailing separator, so with zero
//! overlap the concatenation of all chunk texts reproduces the document
//! byte-for-byte.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ChunkingConfig;
use crate::document::{Chunk, Document};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::cosine_similarity;

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s in document order with provenance
/// metadata set. [`ContextAwareChunker`] leaves embeddings empty for the
/// pipeline to fill in; [`LateChunker`] attaches pooled embeddings itself.
#[async_trait]
pub trait Chunker: Send + Sync {
    /// Split a document into an ordered, non-empty sequence of chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Chunking`] if the document text is empty, or if
    /// it is shorter than the configured minimum and the config is strict.
    /// Embedder failures propagate as [`RagError::Embedding`].
    async fn chunk(&self, document: &Document) -> Result<Vec<Chunk>>;

    /// The strategy name recorded in chunk metadata.
    fn name(&self) -> &'static str;
}

/// Named chunking strategies, selectable by configuration.
///
/// The pipeline is strategy-agnostic: it holds an `Arc<dyn Chunker>` built
/// from this selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    /// Semantic boundary selection ([`ContextAwareChunker`]).
    ContextAware,
    /// Embed first, split after ([`LateChunker`]).
    Late,
}

impl ChunkingStrategy {
    /// Build the chunker for this strategy.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Capability`] if the strategy needs an embedder
    /// capability the provider does not offer (late chunking without
    /// per-unit embeddings). The check happens here, at configuration time,
    /// not when a document is chunked.
    pub fn build(
        self,
        embedder: Arc<dyn EmbeddingProvider>,
        config: ChunkingConfig,
    ) -> Result<Arc<dyn Chunker>> {
        match self {
            ChunkingStrategy::ContextAware => {
                Ok(Arc::new(ContextAwareChunker::new(embedder, config)))
            }
            ChunkingStrategy::Late => Ok(Arc::new(LateChunker::new(embedder, config)?)),
        }
    }
}

/// Split text into atomic units at sentence boundaries and blank lines.
///
/// Each unit keeps its trailing separator (the sentence terminator plus the
/// whitespace run that follows), so concatenating all units reproduces the
/// input exactly.
pub(crate) fn split_units(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '.' | '!' | '?' => matches!(chars.peek(), Some((_, next)) if next.is_whitespace()),
            '\n' => matches!(chars.peek(), Some((_, '\n'))),
            _ => false,
        };
        if boundary {
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if next.is_whitespace() {
                    end = j + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            units.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        units.push(&text[start..]);
    }
    units
}

/// Checks shared by both strategies before segmentation.
///
/// Returns `Some(chunk)` when the document degrades to a single chunk.
fn precheck(document: &Document, config: &ChunkingConfig, strategy: &'static str) -> Result<Option<Chunk>> {
    if document.text.trim().is_empty() {
        return Err(RagError::Chunking(format!(
            "document '{}' has empty text",
            document.id
        )));
    }
    if document.text.chars().count() < config.min_chunk_chars {
        if config.strict {
            return Err(RagError::Chunking(format!(
                "document '{}' is shorter than min_chunk_chars ({})",
                document.id, config.min_chunk_chars
            )));
        }
        return Ok(Some(make_chunk(
            document,
            0,
            document.text.clone(),
            Vec::new(),
            strategy,
        )));
    }
    Ok(None)
}

fn make_chunk(
    document: &Document,
    index: usize,
    text: String,
    embedding: Vec<f32>,
    strategy: &'static str,
) -> Chunk {
    let mut metadata = document.metadata.clone();
    metadata.insert("document_id".to_string(), document.id.clone());
    metadata.insert("chunk_index".to_string(), index.to_string());
    metadata.insert("strategy".to_string(), strategy.to_string());
    Chunk {
        id: format!("{}_{index}", document.id),
        text,
        embedding,
        metadata,
    }
}

/// Running centroid of the unit embeddings merged into the current chunk.
struct Centroid {
    sum: Vec<f32>,
    count: usize,
}

impl Centroid {
    fn new(dimensions: usize) -> Self {
        Self {
            sum: vec![0.0; dimensions],
            count: 0,
        }
    }

    fn push(&mut self, embedding: &[f32]) {
        for (s, x) in self.sum.iter_mut().zip(embedding) {
            *s += x;
        }
        self.count += 1;
    }

    fn mean(&self) -> Vec<f32> {
        let n = self.count.max(1) as f32;
        self.sum.iter().map(|s| s / n).collect()
    }
}

/// Mean-pool a set of unit embeddings into one chunk embedding.
fn mean_pool(embeddings: &[Vec<f32>], indices: &[usize]) -> Vec<f32> {
    let Some(&first) = indices.first() else {
        return Vec::new();
    };
    let mut centroid = Centroid::new(embeddings[first].len());
    for &idx in indices {
        centroid.push(&embeddings[idx]);
    }
    centroid.mean()
}

/// Splits on semantic boundaries rather than fixed character windows.
///
/// Every unit is embedded; adjacent units merge into a growing chunk while
/// the cosine similarity between the chunk's centroid embedding and the
/// next unit stays at or above `similarity_threshold`. A chunk also closes
/// at `max_chunk_units` — the size cap wins even when similarity is high.
/// `overlap_units` trailing units seed the next chunk.
///
/// Emitted chunks carry no embeddings; the pipeline embeds their full text.
///
/// # Example
///
/// ```rust,ignore
/// use ragstore::{ChunkingConfig, ContextAwareChunker};
///
/// let chunker = ContextAwareChunker::new(embedder, ChunkingConfig::default());
/// let chunks = chunker.chunk(&document).await?;
/// ```
pub struct ContextAwareChunker {
    embedder: Arc<dyn EmbeddingProvider>,
    config: ChunkingConfig,
}

impl ContextAwareChunker {
    /// Create a new `ContextAwareChunker`.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: ChunkingConfig) -> Self {
        Self { embedder, config }
    }
}

#[async_trait]
impl Chunker for ContextAwareChunker {
    async fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        if let Some(chunk) = precheck(document, &self.config, self.name())? {
            return Ok(vec![chunk]);
        }

        let units = split_units(&document.text);
        let embeddings = self.embedder.embed_batch(&units).await?;

        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut current = vec![0];
        let mut centroid = Centroid::new(embeddings[0].len());
        centroid.push(&embeddings[0]);

        for idx in 1..units.len() {
            let similarity = cosine_similarity(&centroid.mean(), &embeddings[idx]);
            let full = current.len() >= self.config.max_chunk_units;
            if full || similarity < self.config.similarity_threshold {
                debug!(
                    unit = idx,
                    similarity,
                    cap_forced = full,
                    "chunk boundary"
                );
                let overlap_start = current.len().saturating_sub(self.config.overlap_units);
                let carried: Vec<usize> = current[overlap_start..].to_vec();
                groups.push(current);
                current = carried;
                centroid = Centroid::new(embeddings[idx].len());
                for &c in &current {
                    centroid.push(&embeddings[c]);
                }
            }
            current.push(idx);
            centroid.push(&embeddings[idx]);
        }
        groups.push(current);

        Ok(groups
            .into_iter()
            .enumerate()
            .map(|(i, indices)| {
                let text: String = indices.iter().map(|&idx| units[idx]).collect();
                make_chunk(document, i, text, Vec::new(), self.name())
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "context_aware"
    }
}

/// Embeds the whole document first, then splits.
///
/// Units are embedded in document context via
/// [`EmbeddingProvider::embed_units`], then windowed into chunks of
/// `max_chunk_units` with `overlap_units` overlap; each chunk's embedding
/// is the mean pool of its units' contextualized vectors. The pipeline
/// stores these embeddings as-is instead of re-embedding chunk text.
///
/// Construction fails with [`RagError::Capability`] when the embedder does
/// not offer per-unit embeddings, so an unusable configuration is rejected
/// before any document is processed.
pub struct LateChunker {
    embedder: Arc<dyn EmbeddingProvider>,
    config: ChunkingConfig,
}

impl LateChunker {
    /// Create a new `LateChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Capability`] if the embedder does not support
    /// unit embeddings.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: ChunkingConfig) -> Result<Self> {
        if !embedder.supports_unit_embeddings() {
            return Err(RagError::Capability {
                strategy: "late",
                requirement: "per-unit contextualized embeddings (embed_units)",
            });
        }
        Ok(Self { embedder, config })
    }
}

#[async_trait]
impl Chunker for LateChunker {
    async fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        let degraded = precheck(document, &self.config, self.name())?;

        let units = split_units(&document.text);
        let embeddings = self.embedder.embed_units(&document.text, &units).await?;
        if embeddings.len() != units.len() {
            return Err(RagError::Embedding {
                provider: "unit embedder".to_string(),
                message: format!(
                    "expected {} unit embeddings, got {}",
                    units.len(),
                    embeddings.len()
                ),
            });
        }

        let all: Vec<usize> = (0..units.len()).collect();
        if let Some(mut chunk) = degraded {
            chunk.embedding = mean_pool(&embeddings, &all);
            return Ok(vec![chunk]);
        }

        let step = (self.config.max_chunk_units - self.config.overlap_units).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.config.max_chunk_units).min(units.len());
            let indices: Vec<usize> = (start..end).collect();
            let text: String = indices.iter().map(|&idx| units[idx]).collect();
            let embedding = mean_pool(&embeddings, &indices);
            chunks.push(make_chunk(document, chunks.len(), text, embedding, self.name()));
            if end == units.len() {
                break;
            }
            start += step;
        }

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "late"
    }
}
