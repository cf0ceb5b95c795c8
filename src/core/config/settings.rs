//! Typed view over the merged configuration document.
//!
//! Every field has a default so an empty `config.yml` yields a runnable
//! (if provider-less) server.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub providers: ProviderSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub web_search: WebSearchSettings,
    pub retrieval: RetrievalSettings,
    pub memory: MemorySettings,
    pub ingest: IngestSettings,
}

impl Settings {
    pub fn from_value(value: &Value) -> Result<Self, ApiError> {
        serde_json::from_value(value.clone())
            .map_err(|e| ApiError::Validation(format!("Invalid config: {}", e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Request body cap in MiB. Base64 image uploads count against it.
    pub max_body_mb: usize,
}

impl ServerSettings {
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_allowed_origins: Vec::new(),
            max_body_mb: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Upper bound for any single provider call, in seconds.
    pub timeout_secs: u64,
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// OpenAI-compatible embeddings server (text-embeddings-inference,
    /// LM Studio, ...).
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub dimension: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            api_key: None,
            dimension: 384,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorBackend {
    Pinecone,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub backend: VectorBackend,
    pub index_name: String,
    /// Data-plane host of the index, e.g. `https://ayurwell-index-xxxx.svc.pinecone.io`.
    pub index_host: Option<String>,
    pub api_key: Option<String>,
    pub namespace: Option<String>,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Pinecone,
            index_name: "ayurwell-index".to_string(),
            index_host: None,
            api_key: None,
            namespace: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub search_depth: String,
    pub max_results: Option<u32>,
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key: None,
            search_depth: "basic".to_string(),
            max_results: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    KnowledgeBase,
    WebSearch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    /// Knowledge-base matches are trusted only when the best score is
    /// strictly greater than this value.
    pub relevance_threshold: f32,
    pub strategies: Vec<StrategyKind>,
    pub optimize_query: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            relevance_threshold: 0.15,
            strategies: vec![StrategyKind::KnowledgeBase, StrategyKind::WebSearch],
            optimize_query: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    pub max_entries: usize,
    /// Conversations kept before the least recently used is dropped.
    pub max_conversations: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            max_entries: 20,
            max_conversations: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub data_dir: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            batch_size: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = Settings::from_value(&json!({})).expect("defaults should parse");
        assert_eq!(settings.retrieval.top_k, 3);
        assert!((settings.retrieval.relevance_threshold - 0.15).abs() < f32::EPSILON);
        assert_eq!(
            settings.retrieval.strategies,
            vec![StrategyKind::KnowledgeBase, StrategyKind::WebSearch]
        );
        assert_eq!(settings.memory.max_entries, 20);
        assert_eq!(settings.memory.max_conversations, 1000);
        assert_eq!(settings.server.max_body_bytes(), 20 * 1024 * 1024);
        assert_eq!(settings.embedding.dimension, 384);
        assert_eq!(settings.vector_store.backend, VectorBackend::Pinecone);
        assert_eq!(settings.web_search.search_depth, "basic");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings = Settings::from_value(&json!({
            "retrieval": { "relevance_threshold": 0.5, "strategies": ["web_search"] },
            "vector_store": { "backend": "memory" }
        }))
        .expect("partial config should parse");
        assert!((settings.retrieval.relevance_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(settings.retrieval.top_k, 3);
        assert_eq!(settings.retrieval.strategies, vec![StrategyKind::WebSearch]);
        assert_eq!(settings.vector_store.backend, VectorBackend::Memory);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = Settings::from_value(&json!({
            "retrieval": { "strategies": ["crystal_ball"] }
        }))
        .expect_err("unknown strategy should fail");
        assert!(err.to_string().contains("Invalid config"));
    }
}
