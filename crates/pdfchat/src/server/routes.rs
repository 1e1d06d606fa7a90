//! API routes: PDF ingestion and question answering

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// Request body for `POST /api/rag/ask`
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

/// Response body for `POST /api/rag/ask`
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Response body for `POST /api/rag/ingest`
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub files: usize,
    pub chunks: usize,
}

/// POST /api/rag/ingest - upload and ingest PDF files
pub async fn ingest_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let mut files = 0usize;
    let mut chunks = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::internal(format!("failed to read multipart field: {}", e)))?
    {
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::internal(format!("failed to read upload: {}", e)))?;

        tracing::info!("Ingesting file: {} ({} bytes)", filename, data.len());
        chunks += state.ingest().ingest(&filename, &data).await?;
        files += 1;
    }

    if files == 0 {
        return Err(Error::Config("no file field in upload".to_string()));
    }

    Ok(Json(IngestResponse {
        status: "ingested",
        files,
        chunks,
    }))
}

/// POST /api/rag/ask - answer a question from the ingested documents
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    if request.question.trim().is_empty() {
        return Err(Error::EmptyQuestion);
    }

    let answer = state.rag().answer(&request.question).await?;
    Ok(Json(AskResponse { answer }))
}
