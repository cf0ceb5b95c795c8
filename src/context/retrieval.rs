//! Retrieval strategies and the orchestrator that chains them.
//!
//! Strategies are tried in order; the first one that yields context wins.
//! A strategy never fails the request: provider errors are logged and
//! reported as "no result".

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::core::config::settings::{RetrievalSettings, StrategyKind};
use crate::rag::{EmbeddingProvider, VectorStore};
use crate::tools::WebSearchProvider;

/// Provenance of the context an answer was grounded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceLabel {
    #[serde(rename = "Greeting")]
    Greeting,
    #[serde(rename = "AyurWell Knowledge Base")]
    KnowledgeBase,
    #[serde(rename = "Web Search (Tavily)")]
    WebSearch,
    #[serde(rename = "Direct Knowledge")]
    DirectKnowledge,
    #[serde(rename = "Gemini Vision + RAG")]
    VisionDirect,
}

impl SourceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLabel::Greeting => "Greeting",
            SourceLabel::KnowledgeBase => "AyurWell Knowledge Base",
            SourceLabel::WebSearch => "Web Search (Tavily)",
            SourceLabel::DirectKnowledge => "Direct Knowledge",
            SourceLabel::VisionDirect => "Gemini Vision + RAG",
        }
    }
}

impl std::fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub context: String,
    pub source: SourceLabel,
}

impl RetrievalResult {
    pub fn direct() -> Self {
        Self {
            context: String::new(),
            source: SourceLabel::DirectKnowledge,
        }
    }
}

#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// `None` when this strategy has nothing trustworthy for `query`.
    async fn attempt(&self, query: &str) -> Option<RetrievalResult>;
}

/// Vector search over the knowledge base, gated by the best match score.
pub struct KnowledgeBaseStrategy {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
    threshold: f32,
}

impl KnowledgeBaseStrategy {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        top_k: usize,
        threshold: f32,
    ) -> Self {
        Self {
            embedder,
            store,
            top_k,
            threshold,
        }
    }
}

#[async_trait]
impl RetrievalStrategy for KnowledgeBaseStrategy {
    fn name(&self) -> &str {
        "knowledge_base"
    }

    async fn attempt(&self, query: &str) -> Option<RetrievalResult> {
        let vector = match self.embedder.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Embedding failed, skipping knowledge base: {}", e);
                return None;
            }
        };
        let matches = match self.store.query(&vector, self.top_k, true).await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("{} query failed: {}", self.store.name(), e);
                return None;
            }
        };

        let passages: Vec<(&str, f32)> = matches
            .iter()
            .filter_map(|m| {
                m.metadata
                    .as_ref()
                    .map(|md| md.text.as_str())
                    .filter(|t| !t.is_empty())
                    .map(|t| (t, m.score))
            })
            .collect();

        let best = passages.iter().map(|(_, s)| *s).reduce(f32::max)?;
        tracing::debug!("Best knowledge base score: {}", best);
        if best <= self.threshold {
            tracing::info!(
                "Low relevance in knowledge base ({} <= {})",
                best,
                self.threshold
            );
            return None;
        }

        let context = passages
            .iter()
            .map(|(t, _)| *t)
            .collect::<Vec<_>>()
            .join("\n\n");
        Some(RetrievalResult {
            context,
            source: SourceLabel::KnowledgeBase,
        })
    }
}

pub struct WebSearchStrategy {
    search: Arc<dyn WebSearchProvider>,
}

impl WebSearchStrategy {
    pub fn new(search: Arc<dyn WebSearchProvider>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl RetrievalStrategy for WebSearchStrategy {
    fn name(&self) -> &str {
        "web_search"
    }

    async fn attempt(&self, query: &str) -> Option<RetrievalResult> {
        let results = match self.search.search(query).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("{} search failed: {}", self.search.name(), e);
                return None;
            }
        };
        let context = results
            .iter()
            .map(|r| r.snippet.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if context.trim().is_empty() {
            return None;
        }
        Some(RetrievalResult {
            context,
            source: SourceLabel::WebSearch,
        })
    }
}

#[derive(Default)]
pub struct RetrievalOrchestrator {
    strategies: Vec<Box<dyn RetrievalStrategy>>,
}

impl RetrievalOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_strategy(mut self, strategy: Box<dyn RetrievalStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Builds the strategy chain in the order configured by `settings`.
    pub fn from_settings(
        settings: &RetrievalSettings,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        search: Arc<dyn WebSearchProvider>,
    ) -> Self {
        settings
            .strategies
            .iter()
            .fold(Self::new(), |orchestrator, kind| match kind {
                StrategyKind::KnowledgeBase => {
                    orchestrator.add_strategy(Box::new(KnowledgeBaseStrategy::new(
                        embedder.clone(),
                        store.clone(),
                        settings.top_k,
                        settings.relevance_threshold,
                    )))
                }
                StrategyKind::WebSearch => {
                    orchestrator.add_strategy(Box::new(WebSearchStrategy::new(search.clone())))
                }
            })
    }

    pub async fn retrieve(&self, query: &str) -> RetrievalResult {
        for strategy in &self.strategies {
            if let Some(result) = strategy.attempt(query).await {
                tracing::debug!("Context from '{}' ({})", strategy.name(), result.source);
                return result;
            }
            tracing::debug!("Strategy '{}' produced nothing", strategy.name());
        }
        RetrievalResult::direct()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
