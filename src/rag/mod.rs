//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `VectorStore`: knowledge-base index (Pinecone or in-memory)
//! - `EmbeddingProvider`: text → vector for queries and chunks
//! - `Ingestor`: offline PDF ingestion into the index

pub mod chunker;
pub mod embedding;
pub mod ingest;
pub mod memory;
pub mod pinecone;
pub mod store;

pub use chunker::RecursiveSplitter;
pub use embedding::{EmbeddingProvider, HttpEmbeddingProvider};
pub use ingest::{IngestReport, Ingestor};
pub use memory::InMemoryVectorStore;
pub use pinecone::PineconeStore;
pub use store::{ChunkMetadata, VectorMatch, VectorRecord, VectorStore};
