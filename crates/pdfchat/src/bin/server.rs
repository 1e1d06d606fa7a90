//! pdfchat server binary
//!
//! Run with: cargo run -p pdfchat --bin pdfchat-server

use pdfchat::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdfchat=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration: file when given, env-patched defaults otherwise.
    let config = match std::env::var("PDFCHAT_CONFIG") {
        Ok(path) => RagConfig::load(path)?,
        Err(_) => RagConfig::from_env(),
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - Generation model: {}", config.llm.generate_model);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);
    tracing::info!("  - Table: {}", config.storage.table);

    // Best-effort probe so a missing Ollama is visible at startup.
    tracing::info!("Checking Ollama at {}...", config.llm.base_url);
    let client = reqwest::Client::new();
    match client
        .get(format!("{}/api/tags", config.llm.base_url))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("Ollama is running");
        }
        _ => {
            tracing::warn!("Ollama not available at {}", config.llm.base_url);
            tracing::warn!("Start it with: ollama serve");
            tracing::warn!(
                "Then pull models: ollama pull {} && ollama pull {}",
                config.llm.embed_model,
                config.llm.generate_model
            );
        }
    }

    let server = RagServer::new(config).await?;

    tracing::info!("API: http://{}", server.address());
    tracing::info!("  POST /api/rag/ingest - upload PDF documents");
    tracing::info!("  POST /api/rag/ask    - ask a question");

    server.start().await?;

    Ok(())
}
