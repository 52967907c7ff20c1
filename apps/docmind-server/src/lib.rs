//! HTTP API over the document QA pipeline.
//!
//! - `POST /upload`: multipart `file` field, indexed under its filename
//! - `POST /ask`: `{query, doc_id}` -> `{response}`
//! - `POST /analyze-selection`: `{query, doc_id, context_text?}` -> `{response}`
//! - `GET /health`
//!
//! Errors are returned as `{"error": {"code", "message"}}`.

pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use server::{build_router, serve};
pub use state::AppState;
