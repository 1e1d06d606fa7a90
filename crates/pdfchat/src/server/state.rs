//! Application state for the HTTP server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::OllamaClient;
use crate::ingestion::IngestPipeline;
use crate::retrieval::RagPipeline;
use crate::storage::PgChunkStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    ingest: IngestPipeline,
    rag: RagPipeline,
}

impl AppState {
    /// Wire up storage, the Ollama client, and both pipelines.
    pub async fn new(config: RagConfig) -> Result<Self> {
        let store = PgChunkStore::connect(&config.storage).await?;
        store.prepare_schema(config.storage.dimensions).await?;
        let store: Arc<dyn crate::storage::ChunkStore> = Arc::new(store);
        tracing::info!("Chunk store initialized (table: {})", config.storage.table);

        let ollama = Arc::new(OllamaClient::new(&config.llm));
        tracing::info!(
            "Ollama client initialized (embed: {}, generate: {})",
            config.llm.embed_model,
            config.llm.generate_model
        );

        let ingest = IngestPipeline::new(
            Arc::clone(&store),
            Arc::clone(&ollama) as Arc<dyn crate::providers::Embedder>,
            config.chunking.clone(),
            &config.storage,
        );
        let rag = RagPipeline::new(
            store,
            Arc::clone(&ollama) as Arc<dyn crate::providers::Embedder>,
            ollama as Arc<dyn crate::providers::Generator>,
            &config.storage,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                ingest,
                rag,
            }),
        })
    }

    /// Service configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Ingestion pipeline
    pub fn ingest(&self) -> &IngestPipeline {
        &self.inner.ingest
    }

    /// Retrieval pipeline
    pub fn rag(&self) -> &RagPipeline {
        &self.inner.rag
    }
}
