//! In-memory vector store using cosine distance.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector
//! store backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is
//! suitable for development, testing, and small-scale use cases; it does not
//! survive process restarts (see
//! [`PersistentVectorStore`](crate::PersistentVectorStore) for that).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, Metadata, QueryMatch};
use crate::error::Result;
use crate::vectorstore::{
    CollectionState, QueryFilter, VectorStore, validate_collection_name,
};

/// The collection a store points at before any explicit switch.
pub const DEFAULT_COLLECTION: &str = "document_chunks";

struct StoreInner {
    current: String,
    collections: HashMap<String, CollectionState>,
}

/// An in-memory vector store using cosine distance for ranking.
///
/// Collections are stored as `collection name → collection state`; the
/// store holds a current-collection pointer. Mutations serialize behind a
/// `tokio::sync::RwLock` write guard; reads share.
///
/// # Example
///
/// ```rust,ignore
/// use ragstore::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.switch_collection("docs").await?;
/// ```
pub struct InMemoryVectorStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryVectorStore {
    /// Create a store pointing at [`DEFAULT_COLLECTION`].
    pub fn new() -> Self {
        Self::with_collection(DEFAULT_COLLECTION)
    }

    /// Create a store pointing at the named collection.
    pub fn with_collection(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut collections = HashMap::new();
        collections.insert(name.clone(), CollectionState::default());
        Self {
            inner: RwLock::new(StoreInner {
                current: name,
                collections,
            }),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(
        &self,
        texts: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        metadatas: Option<Vec<Metadata>>,
        ids: Option<Vec<String>>,
    ) -> Result<Vec<String>> {
        let mut inner = self.inner.write().await;
        let current = inner.current.clone();
        let state = inner.collections.entry(current).or_default();
        state.add(texts, embeddings, metadatas, ids)
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
        if let Some(state) = inner.collections.get_mut(&current) {
            state.delete(ids);
        }
        Ok(())
    }

    async fn update_metadata(&self, ids: &[String], metadatas: Vec<Metadata>) -> Result<()> {
        let mut inner = self.inner.write().await;
        let current = inner.current.clone();
        let state = inner.collections.entry(current).or_default();
        state.update_metadata(ids, metadatas)
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
        inner.collections.insert(current, CollectionState::default());
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let mut names: Vec<String> = inner.collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn switch_collection(&self, name: &str) -> Result<()> {
        validate_collection_name(name)?;
        let mut inner = self.inner.write().await;
        inner
            .collections
            .entry(name.to_string())
            .or_default();
        inner.current = name.to_string();
        Ok(())
    }

    async fn current_collection(&self) -> String {
        self.inner.read().await.current.clone()
    }
}
