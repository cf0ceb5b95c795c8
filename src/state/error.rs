use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to initialize {provider} client: {source}")]
    Provider {
        provider: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl InitializationError {
    pub fn provider(provider: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Provider {
            provider,
            source: source.into(),
        }
    }
}
