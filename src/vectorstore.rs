//! Vector store trait for collection-scoped storage and similarity search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, Metadata, QueryMatch};
use crate::error::{RagError, Result};

/// Optional eligibility filters for a similarity query.
///
/// `metadata` entries must all match a chunk's metadata exactly;
/// `text_contains` requires the chunk text to contain the given substring.
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// Exact-match metadata constraints.
    pub metadata: Option<Metadata>,
    /// Substring constraint on chunk text.
    pub text_contains: Option<String>,
}

impl QueryFilter {
    /// Require a metadata key to equal the given value.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value.into());
        self
    }

    /// Require chunk text to contain the given substring.
    pub fn with_text_contains(mut self, needle: impl Into<String>) -> Self {
        self.text_contains = Some(needle.into());
        self
    }
}

/// A storage backend for chunks and their embeddings, partitioned by named
/// collection.
///
/// The store holds a current-collection pointer; every operation except
/// [`list_collections`](VectorStore::list_collections) and
/// [`switch_collection`](VectorStore::switch_collection) is scoped to the
/// current collection. All chunks in one collection share embedding
/// dimensionality, established by the first successful
/// [`add`](VectorStore::add).
///
/// Query ranking uses cosine distance (`1 - cosine similarity`), ascending,
/// with ties broken by insertion order (earlier-inserted first). Both
/// bundled implementations use this metric; implementations must keep their
/// choice consistent within a collection.
///
/// Writes to one collection serialize behind an internal lock; concurrent
/// reads proceed without blocking each other. Callers must not issue
/// [`reset`](VectorStore::reset) concurrently with in-flight `add`/`query`
/// on the same collection without external coordination.
///
/// # Example
///
/// ```rust,ignore
/// use ragstore::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// let ids = store.add(texts, embeddings, None, None).await?;
/// let matches = store.query(&query_embedding, 5, None).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks into the current collection, returning the assigned ids.
    ///
    /// When `ids` is omitted, sequential ids of the form `chunk_<n>` are
    /// reserved from a per-collection counter; generated ids skip over ids
    /// that already exist. Re-adding an existing id overwrites that record
    /// in place, keeping its original insertion rank.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] if `embeddings` (or, when supplied,
    ///   `metadatas`/`ids`) does not match `texts` in length, or any text
    ///   is empty.
    /// - [`RagError::DimensionMismatch`] if an embedding disagrees with the
    ///   collection's established dimensionality.
    async fn add(
        &self,
        texts: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        metadatas: Option<Vec<Metadata>>,
        ids: Option<Vec<String>>,
    ) -> Result<Vec<String>>;

    /// Return up to `k` nearest chunks to `embedding`, nearest first.
    ///
    /// Returns fewer than `k` results when the collection holds fewer
    /// eligible chunks; an under-populated collection is never an error.
    async fn query(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<QueryMatch>>;

    /// Point lookup by id. Unknown ids are omitted from the result.
    async fn get(&self, ids: &[String]) -> Result<Vec<Chunk>>;

    /// Remove chunks by id. Idempotent: absent ids are a no-op.
    async fn delete(&self, ids: &[String]) -> Result<()>;

    /// Replace metadata for existing ids.
    ///
    /// # Errors
    ///
    /// [`RagError::NotFound`] if any id is unknown; nothing is applied in
    /// that case.
    async fn update_metadata(&self, ids: &[String], metadatas: Vec<Metadata>) -> Result<()>;

    /// Current collection size.
    async fn count(&self) -> Result<usize>;

    /// Destroy all chunks in the current collection and reinitialize it
    /// empty. Irreversible; auto-generated ids restart from `chunk_0`.
    async fn reset(&self) -> Result<()>;

    /// Names of all known collections, sorted.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Repoint the store at another collection, creating it lazily.
    /// Other collections are unaffected.
    async fn switch_collection(&self, name: &str) -> Result<()>;

    /// Name of the current collection.
    async fn current_collection(&self) -> String;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Cosine distance: `1 - cosine similarity`. Lower is nearer.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Collection names must be non-empty and filesystem-safe so both store
/// backends accept the same names.
pub(crate) fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RagError::InvalidInput(
            "collection name must not be empty".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RagError::InvalidInput(format!(
            "collection name '{name}' may only contain ASCII alphanumerics, '-' and '_'"
        )));
    }
    Ok(())
}

/// One persisted chunk record. Records are kept in insertion order, which
/// doubles as the query tie-break rank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct StoredRecord {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
}

/// The full state of one collection, shared by the in-memory and persistent
/// stores (and serialized verbatim as the persistent snapshot format).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct CollectionState {
    /// Embedding dimensionality, established by the first successful add.
    pub dimensions: Option<usize>,
    /// Next value for auto-generated `chunk_<n>` ids. Reserved under the
    /// store's write lock; reset() restarts it at 0.
    pub next_id: u64,
    /// Records in insertion order.
    pub records: Vec<StoredRecord>,
}

impl CollectionState {
    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    pub fn add(
        &mut self,
        texts: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        metadatas: Option<Vec<Metadata>>,
        ids: Option<Vec<String>>,
    ) -> Result<Vec<String>> {
        if embeddings.len() != texts.len() {
            return Err(RagError::InvalidInput(format!(
                "got {} texts but {} embeddings",
                texts.len(),
                embeddings.len()
            )));
        }
        if let Some(metadatas) = &metadatas {
            if metadatas.len() != texts.len() {
                return Err(RagError::InvalidInput(format!(
                    "got {} texts but {} metadatas",
                    texts.len(),
                    metadatas.len()
                )));
            }
        }
        if let Some(ids) = &ids {
            if ids.len() != texts.len() {
                return Err(RagError::InvalidInput(format!(
                    "got {} texts but {} ids",
                    texts.len(),
                    ids.len()
                )));
            }
        }
        if texts.iter().any(|t| t.is_empty()) {
            return Err(RagError::InvalidInput(
                "chunk text must not be empty".to_string(),
            ));
        }
        // Dimensionality is committed only after the whole batch validates;
        // a rejected add must not lock an empty collection to a dimension.
        let mut dimensions = self.dimensions;
        for embedding in &embeddings {
            match dimensions {
                Some(expected) if embedding.len() != expected => {
                    return Err(RagError::DimensionMismatch {
                        expected,
                        actual: embedding.len(),
                    });
                }
                Some(_) => {}
                None => dimensions = Some(embedding.len()),
            }
        }
        self.dimensions = dimensions;

        let count = texts.len();
        let mut metadatas = metadatas
            .unwrap_or_else(|| vec![Metadata::new(); count])
            .into_iter();
        let mut assigned = Vec::with_capacity(count);

        let explicit = ids.is_some();
        let mut supplied = ids.unwrap_or_default().into_iter();
        for (text, embedding) in texts.into_iter().zip(embeddings) {
            let id = if explicit {
                supplied.next().unwrap_or_default()
            } else {
                self.reserve_id()
            };
            let record = StoredRecord {
                id: id.clone(),
                text,
                embedding,
                metadata: metadatas.next().unwrap_or_default(),
            };
            match self.position(&id) {
                // Overwrite keeps the original insertion rank.
                Some(pos) => self.records[pos] = record,
                None => self.records.push(record),
            }
            assigned.push(id);
        }

        Ok(assigned)
    }

    fn reserve_id(&mut self) -> String {
        loop {
            let candidate = format!("chunk_{}", self.next_id);
            self.next_id += 1;
            if self.position(&candidate).is_none() {
                return candidate;
            }
        }
    }

    pub fn query(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<QueryMatch>> {
        if self.records.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(expected) = self.dimensions {
            if embedding.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        let mut matches: Vec<QueryMatch> = self
            .records
            .iter()
            .filter(|record| matches_filter(record, filter))
            .map(|record| QueryMatch {
                id: record.id.clone(),
                text: record.text.clone(),
                metadata: record.metadata.clone(),
                distance: cosine_distance(&record.embedding, embedding),
            })
            .collect();

        // Stable sort: equal distances keep insertion order.
        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);
        Ok(matches)
    }

    pub fn get(&self, ids: &[String]) -> Vec<Chunk> {
        ids.iter()
            .filter_map(|id| self.position(id))
            .map(|pos| {
                let record = &self.records[pos];
                Chunk {
                    id: record.id.clone(),
                    text: record.text.clone(),
                    embedding: record.embedding.clone(),
                    metadata: record.metadata.clone(),
                }
            })
            .collect()
    }

    pub fn delete(&mut self, ids: &[String]) {
        self.records.retain(|r| !ids.contains(&r.id));
    }

    pub fn update_metadata(&mut self, ids: &[String], metadatas: Vec<Metadata>) -> Result<()> {
        if metadatas.len() != ids.len() {
            return Err(RagError::InvalidInput(format!(
                "got {} ids but {} metadatas",
                ids.len(),
                metadatas.len()
            )));
        }
        // Validate all ids before touching anything.
        let mut positions = Vec::with_capacity(ids.len());
        for id in ids {
            match self.position(id) {
                Some(pos) => positions.push(pos),
                None => return Err(RagError::NotFound { id: id.clone() }),
            }
        }
        for (pos, metadata) in positions.into_iter().zip(metadatas) {
            self.records[pos].metadata = metadata;
        }
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }
}

fn matches_filter(record: &StoredRecord, filter: Option<&QueryFilter>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    if let Some(metadata) = &filter.metadata {
        for (key, value) in metadata {
            if record.metadata.get(key) != Some(value) {
                return false;
            }
        }
    }
    if let Some(needle) = &filter.text_contains {
        if !record.text.contains(needle) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(ids: &[&str]) -> CollectionState {
        let mut state = CollectionState::default();
        let texts = ids.iter().map(|id| format!("text {id}")).collect();
        let embeddings = vec![vec![1.0, 0.0]; ids.len()];
        let ids = Some(ids.iter().map(|s| s.to_string()).collect());
        state.add(texts, embeddings, None, ids).unwrap();
        state
    }

    #[test]
    fn auto_ids_skip_existing() {
        let mut state = state_with(&["chunk_0"]);
        let ids = state
            .add(vec!["a".into()], vec![vec![0.0, 1.0]], None, None)
            .unwrap();
        assert_eq!(ids, vec!["chunk_1".to_string()]);
    }

    #[test]
    fn overwrite_keeps_insertion_rank() {
        let mut state = state_with(&["a", "b"]);
        state
            .add(
                vec!["replaced".into()],
                vec![vec![0.0, 1.0]],
                None,
                Some(vec!["a".into()]),
            )
            .unwrap();
        assert_eq!(state.count(), 2);
        assert_eq!(state.records[0].id, "a");
        assert_eq!(state.records[0].text, "replaced");
    }

    #[test]
    fn rejected_add_establishes_nothing() {
        let mut state = CollectionState::default();
        let err = state
            .add(
                vec!["a".into(), "b".into()],
                vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0]],
                None,
                None,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(state.count(), 0);
        assert!(state.dimensions.is_none());

        // The still-empty collection accepts either dimensionality.
        state
            .add(vec!["c".into()], vec![vec![1.0, 0.0]], None, None)
            .unwrap();
        assert_eq!(state.dimensions, Some(2));
    }

    #[test]
    fn dimension_established_by_first_add() {
        let mut state = CollectionState::default();
        state
            .add(vec!["a".into()], vec![vec![1.0, 0.0, 0.0]], None, None)
            .unwrap();
        let err = state
            .add(vec!["b".into()], vec![vec![1.0, 0.0]], None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn collection_names_are_validated() {
        assert!(validate_collection_name("docs-v2_test").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("../escape").is_err());
    }
}
