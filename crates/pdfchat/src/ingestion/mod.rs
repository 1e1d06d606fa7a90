//! Document ingestion: extract, chunk, embed, store

pub mod chunker;
pub mod extract;

use serde_json::json;
use std::sync::Arc;

use crate::config::{ChunkingConfig, StorageConfig};
use crate::error::Result;
use crate::providers::Embedder;
use crate::storage::{vector_literal, ChunkStore};

pub use chunker::chunk_text;
pub use extract::extract_text;

/// Drives a document from raw bytes to stored chunk/embedding pairs.
pub struct IngestPipeline {
    store: Arc<dyn ChunkStore>,
    embedder: Arc<dyn Embedder>,
    chunking: ChunkingConfig,
    dimensions: usize,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(
        store: Arc<dyn ChunkStore>,
        embedder: Arc<dyn Embedder>,
        chunking: ChunkingConfig,
        storage: &StorageConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            chunking,
            dimensions: storage.dimensions,
        }
    }

    /// Ingest one uploaded PDF. Returns the number of chunks stored.
    pub async fn ingest(&self, source_name: &str, file_bytes: &[u8]) -> Result<usize> {
        let text = extract_text(file_bytes, source_name)?;
        self.ingest_text(source_name, &text).await
    }

    /// Chunk extracted text and store every chunk with its metadata and
    /// (when available) its embedding.
    ///
    /// Chunks are processed in order. One chunk's embedding failure is logged
    /// and skipped; it never aborts the remaining chunks.
    pub async fn ingest_text(&self, source_name: &str, text: &str) -> Result<usize> {
        let chunks = chunk_text(text, self.chunking.chunk_size, self.chunking.chunk_overlap);

        tracing::info!("Ingesting '{}': {} chunks", source_name, chunks.len());

        for (index, chunk) in chunks.iter().enumerate() {
            tracing::debug!("Processing chunk #{} (len={})", index, chunk.len());

            let embedding = self.embed_with_single_retry(chunk, index).await;

            let id = self
                .store
                .create_chunk(source_name, index as i32, chunk)
                .await?;

            // Metadata is written regardless of the embedding outcome.
            let metadata = json!({"source": source_name, "chunkIndex": index});
            if let Err(e) = self.store.update_metadata(id, &metadata).await {
                tracing::error!("Failed to save metadata for id={}: {}", id, e);
            }

            let Some(embedding) = embedding else {
                tracing::warn!(
                    "Embedding is missing for id={} chunk={}, skipping embedding update",
                    id,
                    index
                );
                continue;
            };

            match vector_literal(&embedding, self.dimensions) {
                Ok(literal) => match self.store.update_embedding(id, &literal).await {
                    Ok(0) => tracing::warn!("Embedding update affected 0 rows for id={}", id),
                    Ok(_) => {}
                    Err(e) => tracing::error!("Failed to save embedding for id={}: {}", id, e),
                },
                Err(e) => {
                    tracing::error!("Rejecting embedding for id={} chunk={}: {}", id, index, e);
                }
            }
        }

        Ok(chunks.len())
    }

    /// One embedding call with a single retry when the first attempt fails or
    /// comes back empty.
    async fn embed_with_single_retry(&self, chunk: &str, index: usize) -> Option<Vec<f32>> {
        match self.embedder.embed(chunk).await {
            Ok(embedding) if !embedding.is_empty() => return Some(embedding),
            Ok(_) => tracing::warn!("First embed attempt returned empty for chunk {}", index),
            Err(e) => tracing::warn!("First embed attempt failed for chunk {}: {}", index, e),
        }

        match self.embedder.embed(chunk).await {
            Ok(embedding) if !embedding.is_empty() => Some(embedding),
            Ok(_) => None,
            Err(e) => {
                tracing::error!("Embedding failed for chunk {}: {}", index, e);
                None
            }
        }
    }
}
