//! Property tests for vector store query ordering.

use ragstore::{InMemoryVectorStore, VectorStore};
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// For any set of stored embeddings, query results are ordered ascending by
/// distance, bounded by `k` and by the collection size, and equal distances
/// keep insertion order.
mod prop_query_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_ascending_and_bounded_by_k(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (matches, count) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                let count = embeddings.len();
                let texts = (0..count).map(|i| format!("text {i}")).collect();
                store.add(texts, embeddings, None, None).await.unwrap();
                let matches = store.query(&query, k, None).await.unwrap();
                (matches, count)
            });

            prop_assert!(matches.len() <= k);
            prop_assert!(matches.len() <= count);

            for window in matches.windows(2) {
                prop_assert!(
                    window[0].distance <= window[1].distance,
                    "results not in ascending order: {} > {}",
                    window[0].distance,
                    window[1].distance,
                );
            }
        }

        #[test]
        fn equal_distances_keep_insertion_order(
            embedding in arb_normalized_embedding(DIM),
            copies in 2usize..8,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let matches = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                let texts = (0..copies).map(|i| format!("text {i}")).collect();
                let embeddings = vec![embedding.clone(); copies];
                store.add(texts, embeddings, None, None).await.unwrap();
                store.query(&embedding, copies, None).await.unwrap()
            });

            let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
            let expected: Vec<String> = (0..copies).map(|i| format!("chunk_{i}")).collect();
            prop_assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
