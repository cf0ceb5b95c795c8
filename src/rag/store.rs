//! Vector store abstraction over the knowledge-base index.
//!
//! The chat path only queries; the ingestion tool upserts. Record metadata
//! must carry the chunk text under `text`, which retrieval depends on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ProviderError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub source: String,
}

/// A stored record: id, embedding, metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Result of a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    /// Similarity score (higher = better).
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<ChunkMetadata>,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    fn name(&self) -> &str;

    /// Nearest records to `vector`, best first.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<VectorMatch>, ProviderError>;

    /// Insert or replace records; returns how many were written.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize, ProviderError>;

    /// Vector dimension of the index, if the backend knows it.
    async fn dimension(&self) -> Result<Option<usize>, ProviderError>;
}
