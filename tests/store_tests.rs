//! Contract tests for the vector store implementations.
//!
//! Each test runs against both the in-memory and the file-backed store via
//! `for_each_store`, since the two must share semantics exactly.

use std::sync::Arc;

use ragstore::{
    InMemoryVectorStore, Metadata, PersistentVectorStore, QueryFilter, RagError, VectorStore,
};

fn meta(pairs: &[(&str, &str)]) -> Metadata {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Run a test body against a fresh instance of each store backend.
async fn for_each_store<F, Fut>(test: F)
where
    F: Fn(Arc<dyn VectorStore>) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    test(Arc::new(InMemoryVectorStore::new())).await;

    let dir = tempfile::tempdir().unwrap();
    let store = PersistentVectorStore::open(dir.path(), "document_chunks").unwrap();
    test(Arc::new(store)).await;
}

#[tokio::test]
async fn add_then_get_round_trips_text_and_metadata() {
    for_each_store(|store| async move {
        let ids = store
            .add(
                vec!["alpha".into(), "beta".into()],
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                Some(vec![meta(&[("k", "a")]), meta(&[("k", "b")])]),
                None,
            )
            .await
            .unwrap();
        assert_eq!(ids, vec!["chunk_0".to_string(), "chunk_1".to_string()]);

        let chunks = store.get(&ids).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "alpha");
        assert_eq!(chunks[0].metadata, meta(&[("k", "a")]));
        assert_eq!(chunks[1].text, "beta");
        assert_eq!(chunks[1].embedding, vec![0.0, 1.0]);
    })
    .await;
}

#[tokio::test]
async fn get_omits_unknown_ids() {
    for_each_store(|store| async move {
        store
            .add(vec!["alpha".into()], vec![vec![1.0, 0.0]], None, None)
            .await
            .unwrap();
        let chunks = store
            .get(&["chunk_0".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "chunk_0");
    })
    .await;
}

#[tokio::test]
async fn query_is_sorted_ascending_with_insertion_order_ties() {
    for_each_store(|store| async move {
        // Two identical vectors (tie) plus one orthogonal vector.
        store
            .add(
                vec!["far".into(), "near_first".into(), "near_second".into()],
                vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 0.0]],
                None,
                Some(vec!["far".into(), "near_first".into(), "near_second".into()]),
            )
            .await
            .unwrap();

        let matches = store.query(&[1.0, 0.0], 10, None).await.unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].id, "near_first");
        assert_eq!(matches[1].id, "near_second");
        assert_eq!(matches[2].id, "far");
        for pair in matches.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    })
    .await;
}

#[tokio::test]
async fn query_with_k_beyond_count_returns_all() {
    for_each_store(|store| async move {
        store
            .add(
                vec!["a".into(), "b".into()],
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                None,
                None,
            )
            .await
            .unwrap();
        let matches = store.query(&[1.0, 0.0], 50, None).await.unwrap();
        assert_eq!(matches.len(), store.count().await.unwrap());
    })
    .await;
}

#[tokio::test]
async fn query_on_empty_collection_is_empty_not_an_error() {
    for_each_store(|store| async move {
        let matches = store.query(&[1.0, 0.0], 5, None).await.unwrap();
        assert!(matches.is_empty());
    })
    .await;
}

#[tokio::test]
async fn delete_is_idempotent() {
    for_each_store(|store| async move {
        store
            .add(vec!["a".into()], vec![vec![1.0, 0.0]], None, None)
            .await
            .unwrap();
        store.delete(&["chunk_0".to_string()]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        // Deleting again, or deleting ids that never existed, is a no-op.
        store.delete(&["chunk_0".to_string()]).await.unwrap();
        store.delete(&["never_there".to_string()]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    })
    .await;
}

#[tokio::test]
async fn update_metadata_replaces_and_rejects_unknown_ids() {
    for_each_store(|store| async move {
        store
            .add(
                vec!["a".into()],
                vec![vec![1.0, 0.0]],
                Some(vec![meta(&[("old", "1")])]),
                None,
            )
            .await
            .unwrap();

        store
            .update_metadata(&["chunk_0".to_string()], vec![meta(&[("new", "2")])])
            .await
            .unwrap();
        let chunks = store.get(&["chunk_0".to_string()]).await.unwrap();
        assert_eq!(chunks[0].metadata, meta(&[("new", "2")]));

        let err = store
            .update_metadata(&["missing".to_string()], vec![meta(&[])])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::NotFound { id } if id == "missing"));
    })
    .await;
}

#[tokio::test]
async fn reset_empties_collection_and_restarts_ids() {
    for_each_store(|store| async move {
        store
            .add(
                vec!["a".into(), "b".into()],
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                None,
                None,
            )
            .await
            .unwrap();
        store.reset().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        let ids = store
            .add(vec!["c".into()], vec![vec![1.0, 0.0]], None, None)
            .await
            .unwrap();
        assert_eq!(ids, vec!["chunk_0".to_string()]);
    })
    .await;
}

#[tokio::test]
async fn dimensionality_is_fixed_by_first_add() {
    for_each_store(|store| async move {
        store
            .add(vec!["a".into()], vec![vec![1.0, 0.0, 0.0]], None, None)
            .await
            .unwrap();

        let err = store
            .add(vec!["b".into()], vec![vec![1.0, 0.0]], None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));

        let err = store.query(&[1.0, 0.0], 5, None).await.unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { .. }));
    })
    .await;
}

#[tokio::test]
async fn rejected_add_does_not_fix_dimensionality() {
    for_each_store(|store| async move {
        // A mixed-dimension batch is rejected outright.
        let err = store
            .add(
                vec!["a".into(), "b".into()],
                vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0]],
                None,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { .. }));
        assert_eq!(store.count().await.unwrap(), 0);

        // The still-empty collection is not locked to the failed batch's
        // first dimensionality.
        store
            .add(vec!["c".into()], vec![vec![1.0, 0.0]], None, None)
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    })
    .await;
}

#[tokio::test]
async fn mismatched_batch_lengths_are_rejected() {
    for_each_store(|store| async move {
        let err = store
            .add(vec!["a".into(), "b".into()], vec![vec![1.0, 0.0]], None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    })
    .await;
}

#[tokio::test]
async fn query_filters_restrict_eligibility() {
    for_each_store(|store| async move {
        store
            .add(
                vec!["the sky is blue".into(), "paris is in france".into()],
                vec![vec![1.0, 0.0], vec![0.9, 0.1]],
                Some(vec![meta(&[("topic", "sky")]), meta(&[("topic", "travel")])]),
                None,
            )
            .await
            .unwrap();

        let filter = QueryFilter::default().with_metadata("topic", "travel");
        let matches = store.query(&[1.0, 0.0], 10, Some(&filter)).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].metadata["topic"], "travel");

        let filter = QueryFilter::default().with_text_contains("sky");
        let matches = store.query(&[1.0, 0.0], 10, Some(&filter)).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].text.contains("sky"));
    })
    .await;
}

#[tokio::test]
async fn collections_are_isolated_and_switchable() {
    for_each_store(|store| async move {
        store
            .add(vec!["a".into()], vec![vec![1.0, 0.0]], None, None)
            .await
            .unwrap();

        store.switch_collection("other").await.unwrap();
        assert_eq!(store.current_collection().await, "other");
        assert_eq!(store.count().await.unwrap(), 0);

        store
            .add(vec!["b".into()], vec![vec![1.0]], None, None)
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        let collections = store.list_collections().await.unwrap();
        assert!(collections.contains(&"document_chunks".to_string()));
        assert!(collections.contains(&"other".to_string()));

        store.switch_collection("document_chunks").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(
            store.get(&["chunk_0".to_string()]).await.unwrap()[0].text,
            "a"
        );
    })
    .await;
}

#[tokio::test]
async fn explicit_ids_are_honored_and_overwritten_in_place() {
    for_each_store(|store| async move {
        store
            .add(
                vec!["first".into(), "second".into()],
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                None,
                Some(vec!["a".into(), "b".into()]),
            )
            .await
            .unwrap();

        store
            .add(
                vec!["replaced".into()],
                vec![vec![0.5, 0.5]],
                None,
                Some(vec!["a".into()]),
            )
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let chunks = store.get(&["a".to_string()]).await.unwrap();
        assert_eq!(chunks[0].text, "replaced");
    })
    .await;
}

#[tokio::test]
async fn persistent_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let ids = {
        let store = PersistentVectorStore::open(dir.path(), "document_chunks").unwrap();
        store
            .add(
                vec!["the sky is blue".into(), "paris is in france".into()],
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                Some(vec![meta(&[("topic", "sky")]), meta(&[("topic", "travel")])]),
                None,
            )
            .await
            .unwrap()
    };

    let reopened = PersistentVectorStore::open(dir.path(), "document_chunks").unwrap();
    assert_eq!(reopened.count().await.unwrap(), 2);

    let chunks = reopened.get(&ids).await.unwrap();
    assert_eq!(chunks[0].text, "the sky is blue");
    assert_eq!(chunks[0].embedding, vec![1.0, 0.0]);
    assert_eq!(chunks[0].metadata, meta(&[("topic", "sky")]));

    // The id counter is durable too: new ids do not collide.
    let new_ids = reopened
        .add(vec!["third".into()], vec![vec![0.5, 0.5]], None, None)
        .await
        .unwrap();
    assert_eq!(new_ids, vec!["chunk_2".to_string()]);

    let matches = reopened.query(&[0.0, 1.0], 1, None).await.unwrap();
    assert_eq!(matches[0].text, "paris is in france");
}

#[tokio::test]
async fn failed_snapshot_write_leaves_memory_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = PersistentVectorStore::open(dir.path(), "document_chunks").unwrap();
    store
        .add(vec!["kept".into()], vec![vec![1.0, 0.0]], None, None)
        .await
        .unwrap();

    // Make the next snapshot write fail by putting a directory where the
    // snapshot file goes.
    let snapshot = dir.path().join("document_chunks.json");
    std::fs::remove_file(&snapshot).unwrap();
    std::fs::create_dir(&snapshot).unwrap();

    let err = store
        .add(vec!["lost".into()], vec![vec![0.0, 1.0]], None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::StoreUnavailable { .. }));

    // Memory did not run ahead of disk: the rejected record is absent.
    assert_eq!(store.count().await.unwrap(), 1);
    assert!(store.get(&["chunk_1".to_string()]).await.unwrap().is_empty());
    assert_eq!(
        store.get(&["chunk_0".to_string()]).await.unwrap()[0].text,
        "kept"
    );
}

#[tokio::test]
async fn persistent_store_lists_collections_from_disk() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = PersistentVectorStore::open(dir.path(), "first").unwrap();
        store
            .add(vec!["a".into()], vec![vec![1.0]], None, None)
            .await
            .unwrap();
        store.switch_collection("second").await.unwrap();
        store
            .add(vec!["b".into()], vec![vec![1.0]], None, None)
            .await
            .unwrap();
    }

    let reopened = PersistentVectorStore::open(dir.path(), "first").unwrap();
    let collections = reopened.list_collections().await.unwrap();
    assert_eq!(collections, vec!["first".to_string(), "second".to_string()]);
}

#[tokio::test]
async fn reset_leaves_other_collections_untouched() {
    for_each_store(|store| async move {
        store
            .add(vec!["a".into()], vec![vec![1.0]], None, None)
            .await
            .unwrap();
        store.switch_collection("other").await.unwrap();
        store
            .add(vec!["b".into()], vec![vec![1.0]], None, None)
            .await
            .unwrap();

        store.reset().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        store.switch_collection("document_chunks").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    })
    .await;
}
