use std::sync::Arc;

use docmind_core::config::ServerConfig;
use docmind_service::DocumentService;

use crate::error::ApiResult;

/// Shared application state
pub struct AppState {
    pub service: Arc<DocumentService>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(service: Arc<DocumentService>, config: ServerConfig) -> Self {
        Self { service, config }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Run a synchronous service call on the blocking pool.
    pub async fn run<T, F>(&self, op: F) -> ApiResult<T>
    where
        F: FnOnce(&DocumentService) -> docmind_core::error::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let service = Arc::clone(&self.service);
        Ok(tokio::task::spawn_blocking(move || op(&service)).await??)
    }
}
