//! Provider traits for the pipelines' collaborators
//!
//! The pipelines talk to the LLM service through these seams so tests can
//! substitute in-process fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::generation::OllamaClient;

/// Produces an embedding vector for a text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Produces final answer text for a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        OllamaClient::embed(self, text).await
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        OllamaClient::generate(self, prompt).await
    }
}
