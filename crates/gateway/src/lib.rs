//! ShadowMesh - Read Gateway
//!
//! Sits in front of the legacy monolith and the replica service during a
//! strangler-fig migration. Each product or review read is sent to the
//! replica with probability `weight / 100` and to legacy otherwise; an
//! unavailable backend gets one retry on the other. Writes always go to
//! legacy.
//!
//! # Routes
//!
//! | Route | Behavior |
//! |-------|----------|
//! | `GET /health` | gateway plus per-backend health |
//! | `GET /admin/status` | weight, read statistics, backend URLs |
//! | `POST /admin/weight` | set the weight (`{"weight": 0..=100}`) |
//! | `POST /admin/reset-stats` | zero the read statistics |
//! | `GET /api/products[/{id}[/reviews]]` | weight-routed read |
//! | writes, `/api/cart*`, `/api/login`, `/api/register` | forwarded to legacy |
//!
//! # Example
//!
//! ```no_run
//! use shadowmesh_config::GatewayConfig;
//! use shadowmesh_gateway::{TrafficRouter, build_router};
//!
//! # async fn run(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let router = TrafficRouter::from_config(&config)?;
//! let app = build_router(router);
//!
//! let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
mod router;
pub mod routes;
pub mod traffic;
mod upstream;

pub use error::{GatewayError, Result, UpstreamError};
pub use router::{HealthReport, RouteOutcome, RoutedRead, TrafficRouter};
pub use routes::build_router;
pub use traffic::{
    Backend, MAX_WEIGHT, RandomPicker, StatsSnapshot, TrafficState, WeightedPicker,
    choose_backend, parse_weight,
};
pub use upstream::{BackendHealth, Upstream, UpstreamResponse, is_unavailable_status};

#[cfg(test)]
mod routes_test;
#[cfg(test)]
mod traffic_test;
#[cfg(test)]
mod test_utils;
