//! Knowledge-base ingestion: PDF → chunks → embeddings → vector store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

use super::chunker::RecursiveSplitter;
use super::embedding::EmbeddingProvider;
use super::store::{ChunkMetadata, VectorRecord, VectorStore};
use crate::core::config::settings::IngestSettings;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub upserted: usize,
}

/// PDF files directly inside `dir`, sorted by name.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("data directory {} does not exist", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to scan {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_pdf = entry
            .path()
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

pub fn extract_pdf_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    pdf_extract::extract_text_from_mem(&bytes)
        .with_context(|| format!("failed to extract text from {}", path.display()))
}

pub struct Ingestor {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    splitter: RecursiveSplitter,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        settings: &IngestSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            splitter: RecursiveSplitter::new(settings.chunk_size, settings.chunk_overlap),
            batch_size: settings.batch_size.max(1),
        }
    }

    /// Fails when the index was built for a different embedding model.
    pub async fn check_dimension(&self) -> Result<()> {
        let expected = self.embedder.dimension();
        match self.store.dimension().await? {
            Some(actual) if actual != expected => bail!(
                "index dimension {} does not match embedding dimension {}; recreate the index",
                actual,
                expected
            ),
            Some(_) => Ok(()),
            None => {
                tracing::warn!(
                    "{} did not report a dimension, assuming {}",
                    self.store.name(),
                    expected
                );
                Ok(())
            }
        }
    }

    /// Chunks, embeds and upserts one document's text. Returns
    /// `(chunks, upserted)`.
    pub async fn ingest_document(&self, source: &str, text: &str) -> Result<(usize, usize)> {
        let chunks = self.splitter.split(text);
        if chunks.is_empty() {
            tracing::warn!("{}: no text to ingest", source);
            return Ok((0, 0));
        }

        let total_batches = chunks.len().div_ceil(self.batch_size);
        let mut upserted = 0;
        for (batch_no, batch) in chunks.chunks(self.batch_size).enumerate() {
            let offset = batch_no * self.batch_size;
            let vectors = self
                .embedder
                .embed_batch(batch)
                .await
                .with_context(|| format!("embedding {} batch {}", source, batch_no + 1))?;

            let records = batch
                .iter()
                .zip(vectors)
                .enumerate()
                .map(|(i, (chunk, values))| VectorRecord {
                    id: format!("{}_{}", source, offset + i),
                    values,
                    metadata: ChunkMetadata {
                        text: chunk.clone(),
                        source: source.to_string(),
                    },
                })
                .collect();

            upserted += self
                .store
                .upsert(records)
                .await
                .with_context(|| format!("upserting {} batch {}", source, batch_no + 1))?;
            tracing::info!(
                "{}: upserted batch {}/{}",
                source,
                batch_no + 1,
                total_batches
            );
        }
        Ok((chunks.len(), upserted))
    }

    pub async fn run(&self, data_dir: &Path) -> Result<IngestReport> {
        self.check_dimension().await?;

        let files = discover_pdfs(data_dir)?;
        if files.is_empty() {
            tracing::warn!("No PDF files found in {}", data_dir.display());
            return Ok(IngestReport::default());
        }
        tracing::info!("Found {} PDF(s). Starting ingestion...", files.len());

        let mut report = IngestReport::default();
        for path in files {
            let source = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            tracing::info!("Processing: {}", path.display());

            let extract_path = path.clone();
            let text = tokio::task::spawn_blocking(move || extract_pdf_text(&extract_path))
                .await
                .context("pdf extraction task panicked")??;

            let (chunks, upserted) = self.ingest_document(&source, &text).await?;
            report.documents += 1;
            report.chunks += chunks;
            report.upserted += upserted;
        }

        tracing::info!(
            "Ingestion complete! Total vectors upserted: {}",
            report.upserted
        );
        Ok(report)
    }
}
