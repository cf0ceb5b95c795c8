//! Process-local vector store.
//!
//! Used for offline development and tests. Contents are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{VectorMatch, VectorRecord, VectorStore};
use crate::core::errors::ProviderError;
use crate::tools::vector_math::rank_descending_by_cosine;

#[derive(Default)]
pub struct InMemoryVectorStore {
    dimension: Option<usize>,
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects records whose length differs from `dimension`.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            records: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<VectorMatch>, ProviderError> {
        let records = self.records.read().await;
        let entries: Vec<&VectorRecord> = records.values().collect();
        let candidates: Vec<Vec<f32>> = entries.iter().map(|r| r.values.clone()).collect();

        let matches = rank_descending_by_cosine(vector, &candidates)
            .into_iter()
            .take(top_k)
            .map(|(idx, score)| {
                let record = entries[idx];
                VectorMatch {
                    id: record.id.clone(),
                    score,
                    metadata: include_metadata.then(|| record.metadata.clone()),
                }
            })
            .collect();
        Ok(matches)
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize, ProviderError> {
        if let Some(expected) = self.dimension {
            if let Some(bad) = records.iter().find(|r| r.values.len() != expected) {
                return Err(ProviderError::decode(
                    "memory",
                    format!(
                        "record {} has dimension {}, index expects {}",
                        bad.id,
                        bad.values.len(),
                        expected
                    ),
                ));
            }
        }

        let count = records.len();
        let mut guard = self.records.write().await;
        for record in records {
            guard.insert(record.id.clone(), record);
        }
        Ok(count)
    }

    async fn dimension(&self) -> Result<Option<usize>, ProviderError> {
        Ok(self.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::store::ChunkMetadata;

    fn record(id: &str, values: Vec<f32>, text: &str) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            values,
            metadata: ChunkMetadata {
                text: text.to_string(),
                source: "test.pdf".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn query_returns_best_matches_first() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                record("a", vec![1.0, 0.0], "turmeric"),
                record("b", vec![0.0, 1.0], "neem"),
                record("c", vec![0.9, 0.1], "ginger"),
            ])
            .await
            .expect("upsert");

        let matches = store.query(&[1.0, 0.0], 2, true).await.expect("query");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert_eq!(matches[1].id, "c");
        assert_eq!(
            matches[0].metadata.as_ref().map(|m| m.text.as_str()),
            Some("turmeric")
        );
    }

    #[tokio::test]
    async fn metadata_is_omitted_on_request() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![record("a", vec![1.0, 0.0], "turmeric")])
            .await
            .expect("upsert");
        let matches = store.query(&[1.0, 0.0], 3, false).await.expect("query");
        assert_eq!(matches.len(), 1);
        assert!(matches[0].metadata.is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_same_id() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![record("a", vec![1.0, 0.0], "old")])
            .await
            .expect("upsert");
        store
            .upsert(vec![record("a", vec![1.0, 0.0], "new")])
            .await
            .expect("upsert");
        assert_eq!(store.len().await, 1);
        let matches = store.query(&[1.0, 0.0], 1, true).await.expect("query");
        assert_eq!(
            matches[0].metadata.as_ref().map(|m| m.text.as_str()),
            Some("new")
        );
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let store = InMemoryVectorStore::with_dimension(3);
        let err = store
            .upsert(vec![record("a", vec![1.0, 0.0], "x")])
            .await
            .expect_err("wrong dimension");
        assert!(err.to_string().contains("expects 3"));
        assert!(store.is_empty().await);
    }
}
