//! ShadowMesh - Replica Read Service
//!
//! The "new" backend of the strangler-fig migration. Serves products, reviews
//! and pricing analytics straight from the replica store that the ingestion
//! pipeline keeps up to date. Read-only: every write goes to legacy.
//!
//! # Routes
//!
//! | Route | Behavior |
//! |-------|----------|
//! | `GET /health` | store round trip; 500 when it fails |
//! | `GET /api/products` | all products, most recently synced first |
//! | `GET /api/products/{id}` | one product with a pricing recommendation |
//! | `GET /api/products/{id}/reviews` | reviews with average rating |
//! | `GET /api/analytics/pricing` | catalogue-wide pricing figures |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use shadowmesh_pipeline::PgReplicaStore;
//! use shadowmesh_replica::build_router;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PgReplicaStore::connect("postgres://localhost/replica_db", 5).await?;
//! let app = build_router(Arc::new(store));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5001").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod routes;

pub use error::{ReplicaError, Result};
pub use routes::{ReplicaState, build_router};

/// `source` value stamped on every response body
pub const SOURCE: &str = "REPLICA";

#[cfg(test)]
mod routes_test;
