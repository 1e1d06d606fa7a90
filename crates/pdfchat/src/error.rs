//! Error types for the pdfchat service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for pdfchat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Question was missing or blank
    #[error("question is required")]
    EmptyQuestion,

    /// A single embedding call failed (transient; callers decide retry policy)
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Every embedding attempt for a question failed
    #[error("Failed to generate query embedding: {0}")]
    EmbeddingFailed(String),

    /// Every candidate generation endpoint was exhausted
    #[error("No working generation endpoint found or generation failed")]
    NoWorkingEndpoint,

    /// Embedding vector rejected before write (non-finite values or wrong width)
    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// Chunk storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding-unavailable error
    pub fn embedding_unavailable(message: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(message.into())
    }

    /// Create an invalid-embedding error
    pub fn invalid_embedding(message: impl Into<String>) -> Self {
        Self::InvalidEmbedding(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<tokio_postgres::Error> for Error {
    fn from(err: tokio_postgres::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::FileParse { filename, message } => (
                StatusCode::BAD_REQUEST,
                "parse_error",
                format!("Failed to parse '{}': {}", filename, message),
            ),
            Error::EmptyQuestion => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                "question is required".to_string(),
            ),
            Error::EmbeddingUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "embedding_error",
                msg.clone(),
            ),
            Error::EmbeddingFailed(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "embedding_error",
                format!("Failed to generate query embedding: {}", msg),
            ),
            Error::NoWorkingEndpoint => (
                StatusCode::SERVICE_UNAVAILABLE,
                "llm_error",
                self.to_string(),
            ),
            Error::InvalidEmbedding(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "embedding_error",
                msg.clone(),
            ),
            Error::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg.clone()),
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
