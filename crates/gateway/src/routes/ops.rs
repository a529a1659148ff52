//! Operations routes
//!
//! Health of the gateway and both backends. Probing never changes the weight.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::router::TrafficRouter;
use crate::upstream::BackendHealth;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `healthy` while the gateway answers
    pub gateway: &'static str,
    pub legacy_status: BackendHealth,
    pub replica_status: BackendHealth,
}

pub fn routes() -> Router<TrafficRouter> {
    Router::new().route("/health", get(health_handler))
}

/// GET /health
async fn health_handler(State(router): State<TrafficRouter>) -> Json<HealthResponse> {
    let report = router.health().await;

    Json(HealthResponse {
        gateway: "healthy",
        legacy_status: report.legacy,
        replica_status: report.replica,
    })
}
