//! Deterministic mock embedders shared by the integration tests.

#![allow(dead_code)]

use std::sync::Once;

use async_trait::async_trait;
use ragstore::{EmbeddingProvider, RagError, Result};

static TRACING: Once = Once::new();

/// Install a fmt subscriber honoring `RUST_LOG`, once per test binary, so
/// pipeline spans show up when a test is run with logging enabled.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Dimensionality of all mock embeddings.
pub const DIM: usize = 4;

/// Map text onto fixed topic axes: 0 = sky/weather, 1 = Paris/France,
/// 2 = Rust, 3 = everything else (weakly).
pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut v = vec![0.0; DIM];
    for word in lower.split(|c: char| !c.is_alphanumeric()) {
        match word {
            "" => {}
            "sky" | "blue" | "cloud" | "clouds" | "sun" | "weather" => v[0] += 1.0,
            "paris" | "france" | "eiffel" | "capital" | "tower" => v[1] += 1.0,
            "rust" | "compiler" | "borrow" | "crate" => v[2] += 1.0,
            _ => v[3] += 0.1,
        }
    }
    if v.iter().all(|x| *x == 0.0) {
        v[3] = 1.0;
    }
    v
}

/// Embeds by topic keywords. No unit-embedding capability.
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(keyword_vector(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Like [`KeywordEmbedder`], but additionally offers per-unit embeddings
/// that blend in the whole document's topic vector, so a unit's vector
/// depends on its document context.
pub struct ContextualUnitEmbedder;

#[async_trait]
impl EmbeddingProvider for ContextualUnitEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(keyword_vector(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn supports_unit_embeddings(&self) -> bool {
        true
    }

    async fn embed_units(&self, document: &str, units: &[&str]) -> Result<Vec<Vec<f32>>> {
        let context = keyword_vector(document);
        Ok(units
            .iter()
            .map(|unit| {
                keyword_vector(unit)
                    .into_iter()
                    .zip(&context)
                    .map(|(u, c)| 0.8 * u + 0.2 * c)
                    .collect()
            })
            .collect())
    }
}

/// Fails single-text embedding for any text containing the word
/// "unembeddable"; batch calls (the path chunkers use for unit embeddings)
/// always succeed, so the failure surfaces at per-chunk embedding time.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains("unembeddable") {
            return Err(RagError::Embedding {
                provider: "mock".to_string(),
                message: "refusing marked input".to_string(),
            });
        }
        Ok(keyword_vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}
