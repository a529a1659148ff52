//! Backend HTTP calls
//!
//! Every call carries an explicit timeout. A read is *unavailable* when it
//! times out, fails to connect, or the backend answers 502/503/504; any other
//! status is the backend's own answer and is passed through.

use std::time::Duration;

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use serde::Serialize;
use shadowmesh_config::GatewayConfig;

use crate::error::{GatewayError, Result, UpstreamError};
use crate::traffic::Backend;

/// A response read in full from a backend
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Result of a backend health probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendHealth {
    /// `/health` answered 2xx
    Healthy,
    /// `/health` answered with another status
    Unhealthy,
    /// No answer within the health timeout
    Unreachable,
}

/// Whether a backend status means "try the other backend"
#[inline]
pub fn is_unavailable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

/// HTTP client for the legacy and replica backends
#[derive(Debug, Clone)]
pub struct Upstream {
    client: reqwest::Client,
    legacy_url: String,
    replica_url: String,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl Upstream {
    pub fn new(
        legacy_url: &str,
        replica_url: &str,
        request_timeout: Duration,
        health_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::Init(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            legacy_url: legacy_url.trim_end_matches('/').to_string(),
            replica_url: replica_url.trim_end_matches('/').to_string(),
            request_timeout,
            health_timeout,
        })
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Self::new(
            &config.legacy_url,
            &config.replica_url,
            config.request_timeout,
            config.health_timeout,
        )
    }

    /// Base URL of a backend
    pub fn url(&self, backend: Backend) -> &str {
        match backend {
            Backend::Legacy => &self.legacy_url,
            Backend::Replica => &self.replica_url,
        }
    }

    /// Send a request and read the full response, whatever its status
    pub async fn send(
        &self,
        backend: Backend,
        method: Method,
        path_and_query: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> std::result::Result<UpstreamResponse, UpstreamError> {
        let url = format!("{}{}", self.url(backend), path_and_query);
        let response = self
            .client
            .request(method, &url)
            .headers(headers)
            .body(body)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }

    /// GET a read path, treating 502/503/504 as unavailability
    pub async fn read(
        &self,
        backend: Backend,
        path_and_query: &str,
        headers: HeaderMap,
    ) -> std::result::Result<UpstreamResponse, UpstreamError> {
        let response = self
            .send(backend, Method::GET, path_and_query, headers, Bytes::new())
            .await?;

        if is_unavailable_status(response.status) {
            return Err(UpstreamError::Status(response.status.as_u16()));
        }
        Ok(response)
    }

    /// Probe `GET {backend}/health` with the health timeout
    pub async fn health(&self, backend: Backend) -> BackendHealth {
        let url = format!("{}/health", self.url(backend));
        match self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => BackendHealth::Healthy,
            Ok(response) => {
                tracing::debug!(
                    backend = %backend,
                    status = %response.status(),
                    "backend unhealthy"
                );
                BackendHealth::Unhealthy
            }
            Err(e) => {
                tracing::debug!(backend = %backend, error = %e, "backend unreachable");
                BackendHealth::Unreachable
            }
        }
    }
}
