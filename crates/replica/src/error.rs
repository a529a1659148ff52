//! Replica service error types

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shadowmesh_pipeline::StoreError;
use thiserror::Error;

/// Read service errors
#[derive(Debug, Error)]
pub enum ReplicaError {
    /// No product row with this id
    #[error("Product not found")]
    ProductNotFound(i64),

    /// Replica store query failed
    #[error("replica store: {0}")]
    Store(#[from] StoreError),
}

impl ReplicaError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ProductNotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProductNotFound(_) => "NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ReplicaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            success: false,
            error: self.code(),
            message: self.to_string(),
        };

        if status.is_server_error() {
            tracing::warn!(
                error_code = body.error,
                error_message = %body.message,
                status = %status,
                "replica read failed"
            );
        } else if let Self::ProductNotFound(id) = self {
            tracing::debug!(product_id = id, "product not in replica");
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for replica handlers
pub type Result<T> = std::result::Result<T, ReplicaError>;
