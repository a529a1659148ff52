//! Weighted read routing with one-shot fallback

use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use serde::Serialize;
use shadowmesh_config::GatewayConfig;
use tracing::{debug, warn};

use crate::error::{GatewayError, Result, UpstreamError};
use crate::traffic::{Backend, RandomPicker, TrafficState, WeightedPicker, choose_backend};
use crate::upstream::{BackendHealth, Upstream, UpstreamResponse};

/// How a routed read ended
#[derive(Debug)]
pub enum RouteOutcome {
    /// Served by the backend the weight picked
    Primary {
        backend: Backend,
        response: UpstreamResponse,
    },
    /// Primary was unavailable; served by the other backend
    Fallback {
        backend: Backend,
        response: UpstreamResponse,
        primary_error: UpstreamError,
    },
    /// Neither backend could serve the read
    Unavailable {
        primary: Backend,
        primary_error: UpstreamError,
        fallback_error: UpstreamError,
    },
}

impl RouteOutcome {
    /// Backend that served the response, if any
    pub fn backend(&self) -> Option<Backend> {
        match self {
            Self::Primary { backend, .. } | Self::Fallback { backend, .. } => Some(*backend),
            Self::Unavailable { .. } => None,
        }
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// A routed read together with the weight it was routed under
#[derive(Debug)]
pub struct RoutedRead {
    pub weight: u8,
    pub outcome: RouteOutcome,
}

/// Health of both backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub legacy: BackendHealth,
    pub replica: BackendHealth,
}

/// Routes reads between legacy and replica and pins writes to legacy
///
/// Cheap to clone; used directly as the axum state.
#[derive(Clone)]
pub struct TrafficRouter {
    traffic: Arc<TrafficState>,
    upstream: Arc<Upstream>,
    picker: Arc<dyn WeightedPicker>,
}

impl TrafficRouter {
    pub fn new(upstream: Upstream, initial_weight: u8) -> Self {
        Self {
            traffic: Arc::new(TrafficState::new(initial_weight)),
            upstream: Arc::new(upstream),
            picker: Arc::new(RandomPicker),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Ok(Self::new(
            Upstream::from_config(config)?,
            config.initial_weight,
        ))
    }

    /// Replace the source of random draws
    pub fn with_picker(mut self, picker: impl WeightedPicker + 'static) -> Self {
        self.picker = Arc::new(picker);
        self
    }

    pub fn traffic(&self) -> &Arc<TrafficState> {
        &self.traffic
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    /// Route one read
    ///
    /// Counts the read once, plus one attempt per backend tried. `headers` go
    /// to whichever backend is tried.
    pub async fn route_read(&self, path_and_query: &str, headers: &HeaderMap) -> RoutedRead {
        let weight = self.traffic.weight();
        let primary = choose_backend(weight, self.picker.draw());
        self.traffic.record_read(primary);

        let primary_error = match self
            .upstream
            .read(primary, path_and_query, headers.clone())
            .await
        {
            Ok(response) => {
                debug!(path = path_and_query, backend = %primary, weight, "read served");
                return RoutedRead {
                    weight,
                    outcome: RouteOutcome::Primary {
                        backend: primary,
                        response,
                    },
                };
            }
            Err(e) => e,
        };

        let fallback = primary.other();
        warn!(
            path = path_and_query,
            primary = %primary,
            fallback = %fallback,
            error = %primary_error,
            "primary backend unavailable, falling back"
        );
        self.traffic.record_attempt(fallback);

        let outcome = match self
            .upstream
            .read(fallback, path_and_query, headers.clone())
            .await
        {
            Ok(response) => RouteOutcome::Fallback {
                backend: fallback,
                response,
                primary_error,
            },
            Err(fallback_error) => {
                warn!(
                    path = path_and_query,
                    error = %fallback_error,
                    "fallback backend unavailable"
                );
                RouteOutcome::Unavailable {
                    primary,
                    primary_error,
                    fallback_error,
                }
            }
        };
        RoutedRead { weight, outcome }
    }

    /// Forward a write to legacy unmodified
    pub async fn forward_write(
        &self,
        method: Method,
        path_and_query: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<UpstreamResponse> {
        self.upstream
            .send(Backend::Legacy, method.clone(), path_and_query, headers, body)
            .await
            .map_err(|e| {
                warn!(method = %method, path = path_and_query, error = %e, "legacy write failed");
                GatewayError::unavailable(format!("legacy {}", e))
            })
    }

    /// Probe both backends concurrently
    pub async fn health(&self) -> HealthReport {
        let (legacy, replica) = tokio::join!(
            self.upstream.health(Backend::Legacy),
            self.upstream.health(Backend::Replica)
        );
        HealthReport { legacy, replica }
    }
}
