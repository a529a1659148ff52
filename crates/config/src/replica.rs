//! Replica read service configuration

use serde::Deserialize;

/// Replica read service configuration
///
/// # Example
///
/// ```toml
/// [replica]
/// host = "0.0.0.0"   # default
/// port = 5001        # default
/// database_url = ""  # default, falls back to ingest.replica_db_url
/// max_connections = 5
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplicaConfig {
    /// Host to bind to
    /// Default: "0.0.0.0"
    pub host: String,

    /// Port to listen on
    /// Default: 5001
    pub port: u16,

    /// Connection URL of the replica store; empty reuses the ingest one
    pub database_url: String,

    /// Read pool size
    /// Default: 5
    pub max_connections: u32,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            database_url: String::new(),
            max_connections: 5,
        }
    }
}

impl ReplicaConfig {
    /// Address to bind, as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
