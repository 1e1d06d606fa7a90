//! HTTP server for the pdfchat service

pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use state::AppState;

/// RAG HTTP Server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a new server
    pub async fn new(config: RagConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Build the router with all routes
    fn build_router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let api = Router::new()
            .route(
                "/rag/ingest",
                post(routes::ingest_pdf)
                    .layer(DefaultBodyLimit::max(self.config.server.max_upload_size)),
            )
            .route("/rag/ask", post(routes::ask));

        Router::new()
            .route("/health", get(health_check))
            .nest("/api", api)
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting pdfchat server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
