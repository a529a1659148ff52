//! Replica service routes

pub mod analytics;
pub mod ops;
pub mod products;

use std::sync::Arc;

use axum::Router;
use shadowmesh_pipeline::ReplicaReader;
use tower_http::trace::TraceLayer;

/// Shared handler state
pub type ReplicaState = Arc<dyn ReplicaReader>;

/// Build the complete read service router
pub fn build_router(reader: ReplicaState) -> Router {
    Router::new()
        .merge(ops::routes())
        .merge(products::routes())
        .nest("/api/analytics", analytics::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(reader)
}
