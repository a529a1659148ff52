//! Gateway routes
//!
//! Grouped HTTP route handlers.

pub mod admin;
pub mod ops;
pub mod proxy;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::router::TrafficRouter;

/// Build the complete gateway router
pub fn build_router(router: TrafficRouter) -> Router {
    Router::new()
        // Operations routes (health)
        .merge(ops::routes())
        // Weight control and statistics
        .nest("/admin", admin::routes())
        // Weighted reads and pinned writes
        .merge(proxy::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(router)
}
