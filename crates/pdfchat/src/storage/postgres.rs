//! Postgres + pgvector chunk store

use async_trait::async_trait;
use serde_json::Value;
use tokio_postgres::NoTls;

use crate::config::StorageConfig;
use crate::error::{Error, Result};

use super::{query_literal, ChunkRow, ChunkStore};

/// Chunk store backed by Postgres with the pgvector extension.
pub struct PgChunkStore {
    client: tokio_postgres::Client,
    table: String,
}

impl PgChunkStore {
    /// Connect to Postgres and spawn the connection driver task.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        validate_table_name(&config.table)?;

        let (client, connection) = tokio_postgres::connect(&config.database_url, NoTls)
            .await
            .map_err(|e| Error::storage(format!("failed to connect to Postgres: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("postgres connection error: {}", e);
            }
        });

        Ok(Self {
            client,
            table: config.table.clone(),
        })
    }

    /// Ensure the vector extension and the chunk table exist.
    pub async fn prepare_schema(&self, dimensions: usize) -> Result<()> {
        self.client
            .batch_execute("CREATE EXTENSION IF NOT EXISTS vector")
            .await?;

        let create = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                source_filename TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                metadata JSONB,
                embedding vector({})
            )",
            self.table, dimensions
        );
        self.client.batch_execute(&create).await?;

        Ok(())
    }
}

#[async_trait]
impl ChunkStore for PgChunkStore {
    async fn create_chunk(&self, source_name: &str, index: i32, content: &str) -> Result<i64> {
        let sql = format!(
            "INSERT INTO {} (source_filename, chunk_index, content) VALUES ($1, $2, $3) RETURNING id",
            self.table
        );
        let row = self
            .client
            .query_one(&sql, &[&source_name, &index, &content])
            .await?;
        Ok(row.get(0))
    }

    async fn update_metadata(&self, id: i64, metadata: &Value) -> Result<u64> {
        let sql = format!("UPDATE {} SET metadata = $1::jsonb WHERE id = $2", self.table);
        let json = metadata.to_string();
        Ok(self.client.execute(&sql, &[&json, &id]).await?)
    }

    async fn update_embedding(&self, id: i64, vector_literal: &str) -> Result<u64> {
        let sql = format!("UPDATE {} SET embedding = $1::vector WHERE id = $2", self.table);
        Ok(self.client.execute(&sql, &[&vector_literal, &id]).await?)
    }

    async fn nearest_neighbors(&self, embedding: &[f32], k: i64) -> Result<Vec<ChunkRow>> {
        let sql = format!(
            "SELECT id, content, metadata FROM {} ORDER BY embedding <-> $1::vector LIMIT $2",
            self.table
        );
        let literal = query_literal(embedding);
        let rows = self.client.query(&sql, &[&literal, &k]).await?;

        Ok(rows
            .into_iter()
            .map(|row| ChunkRow {
                id: row.get(0),
                content: row.get(1),
                metadata: row
                    .try_get::<_, Option<Value>>(2)
                    .unwrap_or(None)
                    .unwrap_or(Value::Null),
            })
            .collect())
    }
}

/// Table names are interpolated into SQL, so restrict them to identifiers.
fn validate_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(Error::Config(format!("invalid table name: {:?}", table)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_are_restricted_to_identifiers() {
        assert!(validate_table_name("document_chunks").is_ok());
        assert!(validate_table_name("chunks2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("chunks; DROP TABLE x").is_err());
    }
}
