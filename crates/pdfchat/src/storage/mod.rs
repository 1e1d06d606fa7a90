//! Chunk storage contract and vector literal encoding

pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

pub use postgres::PgChunkStore;

/// A chunk row returned by a similarity lookup.
#[derive(Debug, Clone)]
pub struct ChunkRow {
    /// Storage-assigned identifier
    pub id: i64,
    /// Chunk text
    pub content: String,
    /// Chunk metadata as stored
    pub metadata: Value,
}

/// Storage contract for document chunks.
///
/// The persistence schema and the vector-similarity engine behind it are a
/// collaborator concern; the pipelines only consume this interface.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Create a chunk row (no metadata, no embedding) and return its id.
    async fn create_chunk(&self, source_name: &str, index: i32, content: &str) -> Result<i64>;

    /// Attach metadata to a chunk; returns rows affected.
    async fn update_metadata(&self, id: i64, metadata: &Value) -> Result<u64>;

    /// Attach an embedding literal to a chunk; returns rows affected.
    async fn update_embedding(&self, id: i64, vector_literal: &str) -> Result<u64>;

    /// The `k` chunks nearest to `embedding`, ordered by ascending distance.
    async fn nearest_neighbors(&self, embedding: &[f32], k: i64) -> Result<Vec<ChunkRow>>;
}

/// Encode an embedding as a pgvector literal, validating it first.
///
/// The literal is bracketed, comma-separated, fixed 12 fractional digits with
/// a period separator regardless of locale. A vector with non-finite elements
/// or the wrong width is rejected so it never reaches the column.
pub fn vector_literal(embedding: &[f32], dimensions: usize) -> Result<String> {
    if embedding.is_empty() {
        return Err(Error::invalid_embedding("embedding is empty"));
    }
    if embedding.len() != dimensions {
        return Err(Error::invalid_embedding(format!(
            "embedding has {} dimensions, column expects {}",
            embedding.len(),
            dimensions
        )));
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(Error::invalid_embedding(
            "embedding contains NaN or infinite values",
        ));
    }

    let body = embedding
        .iter()
        .map(|v| format!("{:.12}", v))
        .collect::<Vec<_>>()
        .join(",");
    Ok(format!("[{}]", body))
}

/// Encode a query embedding for similarity lookup. Queries carry full float
/// precision; only persisted embeddings use the fixed-precision literal.
pub fn query_literal(embedding: &[f32]) -> String {
    let body = embedding
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("[{}]", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_uses_twelve_fractional_digits() {
        let literal = vector_literal(&[0.5, -1.25], 2).unwrap();
        assert_eq!(literal, "[0.500000000000,-1.250000000000]");
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(matches!(
            vector_literal(&[0.1, f32::NAN], 2),
            Err(Error::InvalidEmbedding(_))
        ));
        assert!(matches!(
            vector_literal(&[f32::INFINITY, 0.1], 2),
            Err(Error::InvalidEmbedding(_))
        ));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        assert!(matches!(
            vector_literal(&[0.1, 0.2, 0.3], 2),
            Err(Error::InvalidEmbedding(_))
        ));
        assert!(matches!(
            vector_literal(&[], 2),
            Err(Error::InvalidEmbedding(_))
        ));
    }

    #[test]
    fn query_literal_is_bracketed_and_comma_separated() {
        assert_eq!(query_literal(&[1.0, 2.5]), "[1,2.5]");
    }
}
