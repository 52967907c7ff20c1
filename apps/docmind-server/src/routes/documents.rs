use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub doc_id: String,
    pub filename: String,
    pub chunks: usize,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
    pub doc_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeSelectionRequest {
    pub query: String,
    pub doc_id: String,
    /// Highlighted passage; retrieval falls back to `query` when absent.
    #[serde(default)]
    pub context_text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub response: String,
}

/// `POST /upload`: multipart with a `file` field. The filename becomes the doc id.
pub async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> ApiResult<Json<UploadResponse>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("'file' field has no filename".into()))?;
        let bytes = field.bytes().await?;
        upload = Some((filename, bytes));
        break;
    }
    let (filename, bytes) = upload.ok_or_else(|| ApiError::BadRequest("missing 'file' field".into()))?;

    tracing::info!(filename = %filename, bytes = bytes.len(), "upload received");
    let outcome = state.run(move |service| service.upload(&filename, &bytes)).await?;
    Ok(Json(UploadResponse {
        status: "success".into(),
        doc_id: outcome.doc_id,
        filename: outcome.filename,
        chunks: outcome.chunks,
    }))
}

/// `POST /ask`
pub async fn ask(State(state): State<Arc<AppState>>, ApiJson(req): ApiJson<AskRequest>) -> ApiResult<Json<AnswerResponse>> {
    let response = state.run(move |service| service.ask(&req.doc_id, &req.query)).await?;
    Ok(Json(AnswerResponse { response }))
}

/// `POST /analyze-selection`
pub async fn analyze_selection(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<AnalyzeSelectionRequest>,
) -> ApiResult<Json<AnswerResponse>> {
    let response = state
        .run(move |service| service.analyze_selection(&req.doc_id, &req.query, req.context_text.as_deref()))
        .await?;
    Ok(Json(AnswerResponse { response }))
}
