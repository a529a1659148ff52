//! Kafka Connect REST client

use std::time::Duration;

use reqwest::StatusCode;
use shadowmesh_config::ConnectorConfig;
use tracing::debug;

use crate::config::ConnectorDefinition;
use crate::error::ConnectorError;
use crate::status::ConnectorStatus;
use crate::traits::{ConnectorControl, RegisterResponse};

/// HTTP client for one connector on a Kafka Connect cluster
#[derive(Debug, Clone)]
pub struct ConnectClient {
    client: reqwest::Client,
    base_url: String,
    definition: ConnectorDefinition,
}

impl ConnectClient {
    /// Create a client posting `definition` to `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails
    pub fn new(
        base_url: impl Into<String>,
        definition: ConnectorDefinition,
        timeout: Duration,
    ) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("shadowmesh/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectorError::Init(format!("connect HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            definition,
        })
    }

    /// Create a client from the `[connector]` section
    pub fn from_config(
        config: &ConnectorConfig,
        topic_prefix: &str,
    ) -> Result<Self, ConnectorError> {
        Self::new(
            config.connect_url.clone(),
            ConnectorDefinition::from_config(config, topic_prefix),
            config.request_timeout,
        )
    }

    /// Definition posted on registration
    pub fn definition(&self) -> &ConnectorDefinition {
        &self.definition
    }

    fn connector_url(&self, suffix: &str) -> String {
        format!("{}/connectors/{}{}", self.base_url, self.definition.name, suffix)
    }
}

impl ConnectorControl for ConnectClient {
    fn name(&self) -> &str {
        &self.definition.name
    }

    async fn register(&self) -> Result<RegisterResponse, ConnectorError> {
        let url = format!("{}/connectors", self.base_url);
        let response = self.client.post(&url).json(&self.definition).send().await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(RegisterResponse::Created),
            StatusCode::CONFLICT => Ok(RegisterResponse::AlreadyExists),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ConnectorError::unexpected_status(status.as_u16(), body))
            }
        }
    }

    async fn status(&self) -> ConnectorStatus {
        let url = self.connector_url("/status");
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(connector = %self.definition.name, error = %e, "status request failed");
                return ConnectorStatus::Unreachable(e.to_string());
            }
        };

        match response.status() {
            StatusCode::NOT_FOUND => ConnectorStatus::Missing,
            StatusCode::OK => match response.text().await {
                Ok(body) => ConnectorStatus::from_body(&body),
                Err(e) => ConnectorStatus::Unreachable(e.to_string()),
            },
            status => ConnectorStatus::Error(format!("status endpoint returned {}", status)),
        }
    }

    async fn restart(&self) -> Result<(), ConnectorError> {
        let url = self.connector_url("/restart");
        let response = self.client.post(&url).send().await?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ConnectorError::unexpected_status(status.as_u16(), body))
            }
        }
    }
}
