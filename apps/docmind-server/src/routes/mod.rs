//! HTTP handlers
//!
//! - `health`: liveness check
//! - `documents`: upload, ask, analyze-selection

pub mod documents;
pub mod health;

use crate::error::ApiError;

/// Fallback for undefined routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
