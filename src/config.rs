//! Configuration for chunking strategies.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Tunable parameters shared by both chunking strategies.
///
/// The defaults are implementer-chosen starting points, not constants of
/// the algorithms; callers tuning retrieval quality should treat every
/// field as a knob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkingConfig {
    /// Minimum cosine similarity between a chunk's centroid and the next
    /// unit for the unit to be merged into the chunk (context-aware only).
    pub similarity_threshold: f32,
    /// Maximum number of units per chunk. A chunk closes when it reaches
    /// this size even if similarity stays high.
    pub max_chunk_units: usize,
    /// Number of trailing units carried over into the next chunk.
    pub overlap_units: usize,
    /// Documents shorter than this (in characters) are returned as a single
    /// chunk, or rejected when [`strict`](ChunkingConfig::strict) is set.
    pub min_chunk_chars: usize,
    /// Fail with a chunking error instead of degrading to a single chunk
    /// when the document is shorter than `min_chunk_chars`.
    pub strict: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
            max_chunk_units: 8,
            overlap_units: 0,
            min_chunk_chars: 20,
            strict: false,
        }
    }
}

impl ChunkingConfig {
    /// Create a new builder for constructing a [`ChunkingConfig`].
    pub fn builder() -> ChunkingConfigBuilder {
        ChunkingConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`ChunkingConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChunkingConfigBuilder {
    config: ChunkingConfig,
}

impl ChunkingConfigBuilder {
    /// Set the similarity threshold for merging adjacent units.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the maximum number of units per chunk.
    pub fn max_chunk_units(mut self, units: usize) -> Self {
        self.config.max_chunk_units = units;
        self
    }

    /// Set the number of overlapping units between consecutive chunks.
    pub fn overlap_units(mut self, units: usize) -> Self {
        self.config.overlap_units = units;
        self
    }

    /// Set the minimum document length (in characters) for segmentation.
    pub fn min_chunk_chars(mut self, chars: usize) -> Self {
        self.config.min_chunk_chars = chars;
        self
    }

    /// Fail on too-short documents instead of degrading to a single chunk.
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Build the [`ChunkingConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `max_chunk_units == 0`
    /// - `overlap_units >= max_chunk_units`
    /// - `similarity_threshold` is outside `[-1.0, 1.0]`
    pub fn build(self) -> Result<ChunkingConfig> {
        if self.config.max_chunk_units == 0 {
            return Err(RagError::Config(
                "max_chunk_units must be greater than zero".to_string(),
            ));
        }
        if self.config.overlap_units >= self.config.max_chunk_units {
            return Err(RagError::Config(format!(
                "overlap_units ({}) must be less than max_chunk_units ({})",
                self.config.overlap_units, self.config.max_chunk_units
            )));
        }
        if !(-1.0..=1.0).contains(&self.config.similarity_threshold) {
            return Err(RagError::Config(format!(
                "similarity_threshold ({}) must be within [-1.0, 1.0]",
                self.config.similarity_threshold
            )));
        }
        Ok(self.config)
    }
}
