use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Returns 200 while the server is up, with the number of indexed documents.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "docmind-server",
        "documents": state.service.registry().len(),
        "synthesizer": state.service.synthesizer_name(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
