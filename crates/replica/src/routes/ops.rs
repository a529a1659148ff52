//! Operations routes
//!
//! Health reflects the replica store: the service is only healthy while a
//! query round trip succeeds.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, extract::State, routing::get};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

use super::ReplicaState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn routes() -> Router<ReplicaState> {
    Router::new().route("/health", get(health_handler))
}

/// GET /health
async fn health_handler(State(reader): State<ReplicaState>) -> Response {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    match reader.ping().await {
        Ok(()) => Json(HealthResponse {
            status: "healthy",
            service: "replica",
            timestamp,
            error: None,
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, "replica store ping failed");
            let body = HealthResponse {
                status: "unhealthy",
                service: "replica",
                timestamp,
                error: Some(e.to_string()),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
