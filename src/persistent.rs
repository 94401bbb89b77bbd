//! File-backed vector store with one JSON snapshot per collection.
//!
//! [`PersistentVectorStore`] has the same semantics as
//! [`InMemoryVectorStore`](crate::InMemoryVectorStore) plus a persist
//! directory: every collection lives in `<dir>/<collection>.json` and is
//! rewritten after each mutation, so ids, text, embeddings, and metadata
//! survive process restarts exactly.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Chunk, Metadata, QueryMatch};
use crate::error::{RagError, Result};
use crate::inmemory::DEFAULT_COLLECTION;
use crate::vectorstore::{
    CollectionState, QueryFilter, VectorStore, validate_collection_name,
};

const BACKEND: &str = "Persistent";

fn unavailable(err: impl std::fmt::Display) -> RagError {
    RagError::StoreUnavailable {
        backend: BACKEND.to_string(),
        message: err.to_string(),
    }
}

struct StoreInner {
    current: String,
    collections: HashMap<String, CollectionState>,
}

/// A durable vector store persisting each collection as a JSON snapshot.
///
/// The persist directory is created on open. Collections are loaded lazily
/// when switched to; a collection materializes on disk on its first
/// mutation. Mutations serialize behind a write lock and are flushed to
/// disk before the lock is released; reads are served from memory.
///
/// # Example
///
/// ```rust,ignore
/// use ragstore::{PersistentVectorStore, VectorStore};
///
/// let store = PersistentVectorStore::open("./chunk_db", "document_chunks")?;
/// let ids = store.add(texts, embeddings, None, None).await?;
/// ```
pub struct PersistentVectorStore {
    dir: PathBuf,
    inner: RwLock<StoreInner>,
}

impl PersistentVectorStore {
    /// Open (or create) a store rooted at `dir`, pointing at the named
    /// collection.
    ///
    /// # Errors
    ///
    /// [`RagError::StoreUnavailable`] if the directory cannot be created or
    /// an existing snapshot cannot be read or parsed;
    /// [`RagError::InvalidInput`] for an invalid collection name.
    pub fn open(dir: impl Into<PathBuf>, collection: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        let collection = collection.into();
        validate_collection_name(&collection)?;
        fs::create_dir_all(&dir).map_err(unavailable)?;

        let state = load_snapshot(&dir, &collection)?;
        let mut collections = HashMap::new();
        collections.insert(collection.clone(), state);

        Ok(Self {
            dir,
            inner: RwLock::new(StoreInner {
                current: collection,
                collections,
            }),
        })
    }

    /// Open a store rooted at `dir` with the default collection name.
    pub fn open_default(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::open(dir, DEFAULT_COLLECTION)
    }

    /// The directory this store persists into.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn persist(&self, name: &str, state: &CollectionState) -> Result<()> {
        let bytes = serde_json::to_vec(state).map_err(unavailable)?;
        fs::write(self.snapshot_path(name), bytes).map_err(unavailable)?;
        debug!(collection = name, records = state.count(), "snapshot written");
        Ok(())
    }
}

fn load_snapshot(dir: &Path, name: &str) -> Result<CollectionState> {
    let path = dir.join(format!("{name}.json"));
    if !path.exists() {
        return Ok(CollectionState::default());
    }
    let content = fs::read_to_string(&path).map_err(unavailable)?;
    serde_json::from_str(&content).map_err(unavailable)
}

#[async_trait]
impl VectorStore for PersistentVectorStore {
    async fn add(
        &self,
        texts: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        metadatas: Option<Vec<Metadata>>,
        ids: Option<Vec<String>>,
    ) -> Result<Vec<String>> {
        let mut inner = self.inner.write().await;
        let current = inner.current.clone();
        // Mutate a copy and commit it only once the snapshot is on disk, so
        // a failed write leaves memory and disk in agreement.
        let mut state = inner.collections.get(&current).cloned().unwrap_or_default();
        let assigned = state.add(texts, embeddings, metadatas, ids)?;
        self.persist(&current, &state)?;
        inner.collections.insert(current, state);
        Ok(assigned)
    }

    async fn query(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<QueryMatch>> {
        let inner = self.inner.read().await;
        match inner.collections.get(&inner.current) {
            Some(state) => state.query(embedding, k, filter),
            None => Ok(Vec::new()),
        }
    }

    async fn get(&self, ids: &[String]) -> Result<Vec<Chunk>> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(&inner.current)
            .map(|state| state.get(ids))
            .unwrap_or_default())
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut inner = self.inner.write().await;
        let current = inner.current.clone();
        if let Some(state) = inner.collections.get(&current) {
            let mut state = state.clone();
            state.delete(ids);
            self.persist(&current, &state)?;
            inner.collections.insert(current, state);
        }
        Ok(())
    }

    async fn update_metadata(&self, ids: &[String], metadatas: Vec<Metadata>) -> Result<()> {
        let mut inner = self.inner.write().await;
        let current = inner.current.clone();
        let mut state = inner.collections.get(&current).cloned().unwrap_or_default();
        state.update_metadata(ids, metadatas)?;
        self.persist(&current, &state)?;
        inner.collections.insert(current, state);
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(&inner.current)
            .map(CollectionState::count)
            .unwrap_or(0))
    }

    async fn reset(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        let current = inner.current.clone();
        let state = CollectionState::default();
        self.persist(&current, &state)?;
        inner.collections.insert(current, state);
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let mut names: Vec<String> = inner.collections.keys().cloned().collect();

        let entries = fs::read_dir(&self.dir).map_err(unavailable)?;
        for entry in entries {
            let entry = entry.map_err(unavailable)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn switch_collection(&self, name: &str) -> Result<()> {
        validate_collection_name(name)?;
        let mut inner = self.inner.write().await;
        if !inner.collections.contains_key(name) {
            let state = load_snapshot(&self.dir, name)?;
            inner.collections.insert(name.to_string(), state);
        }
        inner.current = name.to_string();
        Ok(())
    }

    async fn current_collection(&self) -> String {
        self.inner.read().await.current.clone()
    }
}
