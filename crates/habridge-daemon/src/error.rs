//! API error type and its HTTP mapping
//!
//! Error responses never carry a body. Callers only see the status code; an
//! unknown id and an unreachable hub both read as 404.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use habridge_core::{DescriptorError, StoreError};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum ApiError {
    /// Descriptor payload rejected by validation. HTTP 400.
    #[error("invalid descriptor: {0}")]
    Invalid(#[from] DescriptorError),

    /// Request body is not a decodable descriptor. HTTP 400.
    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    /// Edit of an id that does not exist. HTTP 400.
    #[error("no device to update with id {0}")]
    UpdateTargetMissing(String),

    /// Unknown device id. HTTP 404.
    #[error("device not found: {0}")]
    NotFound(String),

    /// Hub snapshot unavailable or hub not configured. HTTP 404.
    #[error("{0} unavailable")]
    Unavailable(&'static str),

    /// Device database could not be written. HTTP 500.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::UpdateTargetMissing(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        status.into_response()
    }
}
