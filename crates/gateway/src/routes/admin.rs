//! Admin routes
//!
//! Traffic weight control and read statistics.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{GatewayError, Result};
use crate::router::TrafficRouter;
use crate::traffic::{Backend, StatsSnapshot, parse_weight};

/// Current routing state
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub traffic_weight: u8,
    pub stats: StatsSnapshot,
    pub legacy_url: String,
    pub replica_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightResponse {
    pub traffic_weight: u8,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub stats: StatsSnapshot,
}

/// Admin routes, nested under `/admin`
pub fn routes() -> Router<TrafficRouter> {
    Router::new()
        .route("/status", get(status_handler))
        .route("/weight", post(weight_handler))
        .route("/reset-stats", post(reset_handler))
}

/// GET /admin/status
async fn status_handler(State(router): State<TrafficRouter>) -> Json<StatusResponse> {
    let traffic = router.traffic();
    Json(StatusResponse {
        traffic_weight: traffic.weight(),
        stats: traffic.stats(),
        legacy_url: router.upstream().url(Backend::Legacy).to_string(),
        replica_url: router.upstream().url(Backend::Replica).to_string(),
    })
}

/// POST /admin/weight
///
/// Body `{"weight": <0..=100>}`. The body is parsed by hand so that every
/// malformed request gets the same `INVALID_WEIGHT` error.
async fn weight_handler(
    State(router): State<TrafficRouter>,
    body: Bytes,
) -> Result<Json<WeightResponse>> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::invalid_weight(format!("body is not JSON: {}", e)))?;
    let weight = parse_weight(value.get("weight"))?;

    let previous = router.traffic().set_weight(weight)?;
    info!(previous, weight, "traffic weight updated");

    Ok(Json(WeightResponse {
        traffic_weight: weight,
    }))
}

/// POST /admin/reset-stats
async fn reset_handler(State(router): State<TrafficRouter>) -> Json<ResetResponse> {
    let stats = router.traffic().reset_stats();
    info!("request statistics reset");
    Json(ResetResponse { stats })
}
