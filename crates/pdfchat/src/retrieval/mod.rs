//! Question answering: embed, retrieve neighbors, generate

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::{Embedder, Generator};
use crate::storage::ChunkStore;

/// Returned instead of invoking generation when retrieval finds nothing.
pub const NO_RELEVANT_EXCERPTS: &str =
    "I couldn't find any relevant document excerpts to answer that.";

/// Answers questions against the ingested corpus.
pub struct RagPipeline {
    store: Arc<dyn ChunkStore>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    top_k: i64,
    embed_attempts: u64,
    embed_backoff_ms: u64,
}

impl RagPipeline {
    /// Create a new retrieval pipeline
    pub fn new(
        store: Arc<dyn ChunkStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        storage: &StorageConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            top_k: storage.top_k,
            embed_attempts: storage.embed_attempts.max(1),
            embed_backoff_ms: storage.embed_backoff_ms,
        }
    }

    /// Answer a question from the ingested documents.
    pub async fn answer(&self, question: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Err(Error::EmptyQuestion);
        }

        let embedding = self.embed_with_retry(question).await?;
        tracing::debug!("Question embedding has {} dimensions", embedding.len());

        let excerpts = self.store.nearest_neighbors(&embedding, self.top_k).await?;
        if excerpts.is_empty() {
            return Ok(NO_RELEVANT_EXCERPTS.to_string());
        }

        let prompt = PromptBuilder::build_prompt(&excerpts, question);
        self.generator.generate(&prompt).await
    }

    /// Embed the question with bounded attempts and linear backoff. Exhaustion
    /// is terminal for this question and surfaces as service-unavailable.
    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        for attempt in 1..=self.embed_attempts {
            match self.embedder.embed(text).await {
                Ok(embedding) if !embedding.is_empty() => return Ok(embedding),
                Ok(_) => {
                    tracing::warn!("Embed returned empty on attempt {}", attempt);
                }
                Err(e) => {
                    tracing::warn!("Embed failed on attempt {}: {}", attempt, e);
                }
            }
            if attempt < self.embed_attempts {
                sleep(Duration::from_millis(self.embed_backoff_ms * attempt)).await;
            }
        }

        tracing::error!(
            "Embed failed after {} attempts for text length={}",
            self.embed_attempts,
            text.len()
        );
        Err(Error::EmbeddingFailed(format!(
            "no embedding after {} attempts",
            self.embed_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ChunkRow;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedStore {
        rows: Vec<ChunkRow>,
    }

    #[async_trait]
    impl ChunkStore for FixedStore {
        async fn create_chunk(&self, _: &str, _: i32, _: &str) -> Result<i64> {
            Ok(1)
        }

        async fn update_metadata(&self, _: i64, _: &Value) -> Result<u64> {
            Ok(1)
        }

        async fn update_embedding(&self, _: i64, _: &str) -> Result<u64> {
            Ok(1)
        }

        async fn nearest_neighbors(&self, _: &[f32], k: i64) -> Result<Vec<ChunkRow>> {
            Ok(self.rows.iter().take(k as usize).cloned().collect())
        }
    }

    struct CountingEmbedder {
        calls: AtomicUsize,
        failures_before_success: usize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, _: &str) -> Result<Vec<f32>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures_before_success {
                return Err(Error::embedding_unavailable("down"));
            }
            Ok(vec![0.1, 0.2])
        }
    }

    struct CountingGenerator {
        calls: AtomicUsize,
        reply: String,
    }

    #[async_trait]
    impl Generator for CountingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(prompt.ends_with("Answer:"));
            Ok(self.reply.clone())
        }
    }

    fn storage_config() -> StorageConfig {
        StorageConfig {
            embed_backoff_ms: 1,
            ..StorageConfig::default()
        }
    }

    fn row(id: i64, content: &str) -> ChunkRow {
        ChunkRow {
            id,
            content: content.to_string(),
            metadata: json!({}),
        }
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let pipeline = RagPipeline::new(
            Arc::new(FixedStore { rows: Vec::new() }),
            Arc::new(CountingEmbedder {
                calls: AtomicUsize::new(0),
                failures_before_success: 0,
            }),
            Arc::new(CountingGenerator {
                calls: AtomicUsize::new(0),
                reply: String::new(),
            }),
            &storage_config(),
        );

        assert!(matches!(
            pipeline.answer("   ").await.unwrap_err(),
            Error::EmptyQuestion
        ));
    }

    #[tokio::test]
    async fn no_neighbors_skips_generation() {
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
            reply: "unused".to_string(),
        });
        let pipeline = RagPipeline::new(
            Arc::new(FixedStore { rows: Vec::new() }),
            Arc::new(CountingEmbedder {
                calls: AtomicUsize::new(0),
                failures_before_success: 0,
            }),
            Arc::clone(&generator) as Arc<dyn Generator>,
            &storage_config(),
        );

        let answer = pipeline.answer("what is this?").await.unwrap();

        assert_eq!(answer, NO_RELEVANT_EXCERPTS);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transient_embed_failure_is_retried() {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            failures_before_success: 1,
        });
        let pipeline = RagPipeline::new(
            Arc::new(FixedStore {
                rows: vec![row(1, "Paris is the capital of France.")],
            }),
            Arc::clone(&embedder) as Arc<dyn Embedder>,
            Arc::new(CountingGenerator {
                calls: AtomicUsize::new(0),
                reply: "Paris [1].".to_string(),
            }),
            &storage_config(),
        );

        let answer = pipeline.answer("capital of France?").await.unwrap();

        assert_eq!(answer, "Paris [1].");
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_embed_attempts_fail_terminally() {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            failures_before_success: usize::MAX,
        });
        let pipeline = RagPipeline::new(
            Arc::new(FixedStore { rows: Vec::new() }),
            Arc::clone(&embedder) as Arc<dyn Embedder>,
            Arc::new(CountingGenerator {
                calls: AtomicUsize::new(0),
                reply: String::new(),
            }),
            &storage_config(),
        );

        let err = pipeline.answer("anything at all?").await.unwrap_err();

        assert!(matches!(err, Error::EmbeddingFailed(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }
}
