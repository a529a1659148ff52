//! Error types for connectors

use thiserror::Error;

/// Errors that can occur while talking to the connector REST API
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Failed to initialize the client (e.g., HTTP client creation failed)
    #[error("failed to initialize connector client: {0}")]
    Init(String),

    /// HTTP request failed (connection refused, timeout, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The REST API answered with a status the operation does not accept
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

impl ConnectorError {
    /// Create an unexpected status error, truncating long bodies
    pub fn unexpected_status(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > MAX_ERROR_BODY {
            let cut = floor_char_boundary(&body, MAX_ERROR_BODY);
            body.truncate(cut);
        }
        Self::UnexpectedStatus { status, body }
    }
}

/// Longest response body kept in an error message
const MAX_ERROR_BODY: usize = 500;

/// Largest index <= `max` that lies on a char boundary
pub(crate) fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
