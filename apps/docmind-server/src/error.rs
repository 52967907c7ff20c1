use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use docmind_core::error::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => match e {
                Error::Configuration(_) | Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                Error::Embedding(_) => StatusCode::SERVICE_UNAVAILABLE,
                Error::EmptyIndex | Error::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                Error::Synthesis(_) => StatusCode::BAD_GATEWAY,
                Error::DimensionMismatch { .. } | Error::Io(_) | Error::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Core(e) => match e {
                Error::Configuration(_) => "CONFIGURATION_ERROR",
                Error::Embedding(_) => "EMBEDDING_ERROR",
                Error::EmptyIndex => "EMPTY_DOCUMENT",
                Error::InvalidArgument(_) => "INVALID_ARGUMENT",
                Error::NotFound(_) => "DOCUMENT_NOT_FOUND",
                Error::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
                Error::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
                Error::Parse(_) => "PARSE_ERROR",
                Error::Synthesis(_) => "SYNTHESIS_ERROR",
                Error::Io(_) => "IO_ERROR",
                Error::Serialization(_) => "SERIALIZATION_ERROR",
            },
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "request rejected");
        }
        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("worker task failed: {err}"))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge(err.body_text());
        }
        ApiError::BadRequest(format!("invalid multipart body: {}", err.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::BadRequest(format!("invalid JSON body: {}", err.body_text()))
    }
}
