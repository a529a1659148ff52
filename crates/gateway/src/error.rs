//! Gateway error types
//!
//! Provides structured error responses for the HTTP surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Weight is not an integer in 0..=100
    #[error("invalid weight: {0}")]
    InvalidWeight(String),

    /// No backend could serve the request
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Gateway could not be set up (HTTP client, bind address)
    #[error("gateway init failed: {0}")]
    Init(String),
}

impl GatewayError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidWeight(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Init(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidWeight(_) => "INVALID_WEIGHT",
            Self::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            Self::Init(_) => "INTERNAL_ERROR",
        }
    }

    // Helper constructors

    /// Create an invalid weight error
    pub fn invalid_weight(msg: impl Into<String>) -> Self {
        Self::InvalidWeight(msg.into())
    }

    /// Create an upstream unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }
}

/// Why a backend call did not produce a usable response
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// No response within the request timeout
    #[error("timed out")]
    Timeout,

    /// Connection refused or reset before a response
    #[error("connection failed: {0}")]
    Connect(String),

    /// Backend answered 502, 503 or 504
    #[error("responded {0}")]
    Status(u16),

    /// Any other transport failure (malformed response, body read error)
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub error: &'static str,
    /// Error message (human-readable)
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
        };

        tracing::warn!(
            error_code = body.error,
            error_message = %body.message,
            status = %status,
            "gateway error"
        );

        (status, Json(body)).into_response()
    }
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
