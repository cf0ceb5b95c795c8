use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use ayurwell_backend::core::logging;
use ayurwell_backend::core::config::{AppPaths, ConfigService};
use ayurwell_backend::rag::Ingestor;
use ayurwell_backend::state::Providers;

/// Usage: `ayurwell-ingest [DATA_DIR]`. Defaults to `ingest.data_dir`
/// resolved against the project root.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "ingest.log");

    let config = ConfigService::new(paths.clone());
    let settings = config.load_settings().context("Failed to load configuration")?;
    let providers = Providers::from_settings(&settings)?;
    if !providers.status.vector_store {
        anyhow::bail!("Vector store is not configured; set PINECONE_API_KEY and PINECONE_INDEX_HOST");
    }

    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.project_root.join(&settings.ingest.data_dir));

    let ingestor = Ingestor::new(providers.embedder, providers.store, &settings.ingest);
    let report = ingestor.run(&data_dir).await?;
    tracing::info!(
        "Ingested {} document(s), {} chunk(s), {} vector(s)",
        report.documents,
        report.chunks,
        report.upserted
    );
    Ok(())
}
