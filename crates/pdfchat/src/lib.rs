//! pdfchat: question answering over ingested PDF documents
//!
//! A retrieval-augmented-generation service backed by a locally hosted Ollama
//! instance and a pgvector chunk store. Uploaded PDFs are split into
//! overlapping windows, embedded, and stored; questions are embedded,
//! matched against the nearest stored chunks, and answered by the generation
//! model from those excerpts only.
//!
//! The Ollama client is deliberately defensive: the generation API is probed
//! across several endpoint shapes, partial completions are polled, and the
//! heterogeneous response payloads are normalized before the final answer is
//! extracted.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::OllamaClient;
pub use ingestion::IngestPipeline;
pub use retrieval::RagPipeline;
pub use storage::{ChunkRow, ChunkStore};
