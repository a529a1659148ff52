//! Gateway configuration
//!
//! Where the read gateway listens, which two backends it splits traffic
//! between, and how long it waits for them.

use std::time::Duration;

use serde::Deserialize;

/// Traffic gateway configuration
///
/// # Example
///
/// ```toml
/// [gateway]
/// host = "0.0.0.0"                        # default
/// port = 4000                             # default
/// legacy_url = "http://monolith:5000"     # required
/// replica_url = "http://microservice:5001" # required
/// initial_weight = 0                      # default, 0..=100
/// request_timeout = "10s"                 # default
/// health_timeout = "5s"                   # default
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    /// Default: "0.0.0.0"
    pub host: String,

    /// Port to listen on
    /// Default: 4000
    pub port: u16,

    /// Base URL of the legacy backend (authoritative, receives all writes)
    pub legacy_url: String,

    /// Base URL of the replica backend
    pub replica_url: String,

    /// Percentage of reads sent to the replica at startup
    /// Default: 0
    pub initial_weight: u8,

    /// Timeout for a forwarded request
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Timeout for a backend health probe
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub health_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            legacy_url: String::new(),
            replica_url: String::new(),
            initial_weight: 0,
            request_timeout: Duration::from_secs(10),
            health_timeout: Duration::from_secs(5),
        }
    }
}

impl GatewayConfig {
    /// Address to bind, as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
