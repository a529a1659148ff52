//! Pricing analytics route

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use shadowmesh_transform::PricingAnalytics;

use super::ReplicaState;
use crate::SOURCE;
use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub success: bool,
    pub source: &'static str,
    pub analytics: PricingAnalytics,
}

pub fn routes() -> Router<ReplicaState> {
    Router::new().route("/pricing", get(pricing_handler))
}

/// GET /api/analytics/pricing
async fn pricing_handler(State(reader): State<ReplicaState>) -> Result<Json<AnalyticsResponse>> {
    let aggregates = reader.pricing_aggregates().await?;

    Ok(Json(AnalyticsResponse {
        success: true,
        source: SOURCE,
        analytics: PricingAnalytics::from(aggregates),
    }))
}
