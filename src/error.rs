use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a reading store. Load-time variants are fatal to
/// startup; `NotInitialized` surfaces as a server-state error at query time.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dataset not found at {}", .path.display())]
    DataUnavailable { path: PathBuf },
    #[error("dataset schema error: {detail}")]
    Schema { detail: String },
    #[error("data store not initialized")]
    NotInitialized,
}

/// Invalid caller input rejected by the query facade.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("end_date must not precede start_date")]
    EndBeforeStart,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                detail: self.message,
            }),
        )
            .into_response()
    }
}

impl From<InputError> for ApiError {
    fn from(err: InputError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "store error");
        Self::internal(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
