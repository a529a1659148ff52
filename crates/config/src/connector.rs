//! CDC connector configuration
//!
//! Settings for registering and supervising the change-data-capture connector
//! on the Kafka Connect REST API. The topic prefix is shared with `[ingest]`.

use std::time::Duration;

use serde::Deserialize;

/// CDC connector configuration
///
/// # Example
///
/// ```toml
/// [connector]
/// connect_url = "http://connect:8083"     # default
/// name = "monolith-full-sync"             # default
/// db_host = "monolith_db"                 # default
/// db_port = 5432                          # default
/// db_user = "postgres"
/// db_password = "postgres"
/// db_name = "monolith_db"
/// tables = ["public.products", "public.reviews"]  # default
/// max_attempts = 10                       # default
/// retry_delay = "5s"                      # default
/// watchdog = true                         # default
/// watchdog_interval = "15s"               # default
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Kafka Connect REST endpoint
    /// Default: "http://connect:8083"
    pub connect_url: String,

    /// Connector name
    /// Default: "monolith-full-sync"
    pub name: String,

    /// Legacy database host as seen from the connector
    pub db_host: String,

    /// Legacy database port
    pub db_port: u16,

    /// Legacy database user
    pub db_user: String,

    /// Legacy database password
    pub db_password: String,

    /// Legacy database name
    pub db_name: String,

    /// Captured tables, schema qualified
    pub tables: Vec<String>,

    /// Logical decoding plugin
    /// Default: "pgoutput"
    pub plugin_name: String,

    /// Replication slot name
    /// Default: "debezium_slot"
    pub slot_name: String,

    /// Publication name
    /// Default: "dbz_publication"
    pub publication_name: String,

    /// Snapshot mode
    /// Default: "initial"
    pub snapshot_mode: String,

    /// How the connector encodes NUMERIC columns ("string" or "precise")
    /// Default: "string"
    pub decimal_handling_mode: String,

    /// Registration attempts before giving up
    /// Default: 10
    pub max_attempts: u32,

    /// Fixed delay between registration attempts
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Timeout for a single REST call
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Run the connector watchdog alongside ingestion
    /// Default: true
    pub watchdog: bool,

    /// Interval between watchdog status checks
    /// Default: 15s
    #[serde(with = "humantime_serde")]
    pub watchdog_interval: Duration,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            connect_url: "http://connect:8083".to_string(),
            name: "monolith-full-sync".to_string(),
            db_host: "monolith_db".to_string(),
            db_port: 5432,
            db_user: "postgres".to_string(),
            db_password: "postgres".to_string(),
            db_name: "monolith_db".to_string(),
            tables: vec!["public.products".to_string(), "public.reviews".to_string()],
            plugin_name: "pgoutput".to_string(),
            slot_name: "debezium_slot".to_string(),
            publication_name: "dbz_publication".to_string(),
            snapshot_mode: "initial".to_string(),
            decimal_handling_mode: "string".to_string(),
            max_attempts: 10,
            retry_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            watchdog: true,
            watchdog_interval: Duration::from_secs(15),
        }
    }
}

impl ConnectorConfig {
    /// Value for the connector's `table.include.list`
    pub fn table_include_list(&self) -> String {
        self.tables.join(",")
    }
}
