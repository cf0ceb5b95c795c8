use std::sync::Arc;

use crate::context::{ChatPipeline, ConversationStore, RetrievalOrchestrator};
use crate::core::config::settings::VectorBackend;
use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::llm::{GeminiProvider, LlmProvider};
use crate::rag::{EmbeddingProvider, HttpEmbeddingProvider, InMemoryVectorStore, PineconeStore, VectorStore};
use crate::tools::{TavilySearch, WebSearchProvider};

pub mod error;

use error::InitializationError;

/// Which external providers have credentials. Reported by `/health`.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct ProviderStatus {
    pub llm: bool,
    pub vector_store: bool,
    pub web_search: bool,
}

/// Global application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Arc<Settings>,
    pub pipeline: Arc<ChatPipeline>,
    pub providers: ProviderStatus,
}

/// Provider handles the chat pipeline is assembled from.
pub struct Providers {
    pub llm: Arc<dyn LlmProvider>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub store: Arc<dyn VectorStore>,
    pub search: Arc<dyn WebSearchProvider>,
    pub status: ProviderStatus,
}

impl Providers {
    /// Real HTTP clients configured from `settings`. Missing credentials
    /// are not an error here; the affected calls fail (and degrade) at
    /// request time.
    pub fn from_settings(settings: &Settings) -> Result<Self, InitializationError> {
        let timeout = settings.providers.timeout();

        let gemini = GeminiProvider::new(&settings.llm, timeout)
            .map_err(|e| InitializationError::provider("gemini", e))?;
        let embedder = HttpEmbeddingProvider::new(&settings.embedding, timeout)
            .map_err(|e| InitializationError::provider("embeddings", e))?;
        let tavily = TavilySearch::new(&settings.web_search, timeout)
            .map_err(|e| InitializationError::provider("tavily", e))?;

        let (store, store_ready): (Arc<dyn VectorStore>, bool) = match settings.vector_store.backend {
            VectorBackend::Pinecone => {
                let pinecone = PineconeStore::new(&settings.vector_store, timeout)
                    .map_err(|e| InitializationError::provider("pinecone", e))?;
                let ready = pinecone.is_configured();
                (Arc::new(pinecone), ready)
            }
            VectorBackend::Memory => (
                Arc::new(InMemoryVectorStore::with_dimension(settings.embedding.dimension)),
                true,
            ),
        };

        let status = ProviderStatus {
            llm: gemini.is_configured(),
            vector_store: store_ready,
            web_search: tavily.is_configured(),
        };
        if !status.llm {
            tracing::warn!("GOOGLE_API_KEY not set");
        }
        if !status.vector_store {
            tracing::warn!("PINECONE_API_KEY or PINECONE_INDEX_HOST not set");
        }
        if !status.web_search {
            tracing::warn!("TAVILY_API_KEY not set");
        }

        Ok(Self {
            llm: Arc::new(gemini),
            embedder: Arc::new(embedder),
            store,
            search: Arc::new(tavily),
            status,
        })
    }
}

impl AppState {
    /// Loads configuration and builds the provider clients.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;
        let providers = Providers::from_settings(&settings)?;
        Ok(Arc::new(Self::assemble(paths, config, settings, providers)))
    }

    /// Wires already-built providers into the chat pipeline.
    pub fn assemble(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: Settings,
        providers: Providers,
    ) -> Self {
        let retrieval = RetrievalOrchestrator::from_settings(
            &settings.retrieval,
            providers.embedder,
            providers.store,
            providers.search,
        );
        let conversations = ConversationStore::with_capacity(
            settings.memory.max_entries,
            settings.memory.max_conversations,
        );
        let pipeline = ChatPipeline::new(
            providers.llm,
            retrieval,
            conversations,
            settings.retrieval.optimize_query,
        );

        AppState {
            paths,
            config,
            settings: Arc::new(settings),
            pipeline: Arc::new(pipeline),
            providers: providers.status,
        }
    }
}
