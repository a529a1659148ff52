//! Connector definition
//!
//! The JSON document posted to `POST /connectors`, built from the
//! `[connector]` config section and the ingestion topic prefix.

use std::collections::BTreeMap;

use serde::Serialize;
use shadowmesh_config::ConnectorConfig;

/// Connector class of the Postgres CDC source
pub const CONNECTOR_CLASS: &str = "io.debezium.connector.postgresql.PostgresConnector";

/// Converter used for keys and values
pub const JSON_CONVERTER: &str = "org.apache.kafka.connect.json.JsonConverter";

/// Registration payload: `{"name": ..., "config": {...}}`
///
/// Every config value is a string, as the REST API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectorDefinition {
    pub name: String,
    pub config: BTreeMap<String, String>,
}

impl ConnectorDefinition {
    /// Build the definition for the legacy store
    pub fn from_config(config: &ConnectorConfig, topic_prefix: &str) -> Self {
        let entries = [
            ("connector.class", CONNECTOR_CLASS.to_string()),
            ("database.hostname", config.db_host.clone()),
            ("database.port", config.db_port.to_string()),
            ("database.user", config.db_user.clone()),
            ("database.password", config.db_password.clone()),
            ("database.dbname", config.db_name.clone()),
            ("database.server.name", topic_prefix.to_string()),
            ("topic.prefix", topic_prefix.to_string()),
            ("table.include.list", config.table_include_list()),
            ("plugin.name", config.plugin_name.clone()),
            ("slot.name", config.slot_name.clone()),
            ("publication.name", config.publication_name.clone()),
            ("snapshot.mode", config.snapshot_mode.clone()),
            ("decimal.handling.mode", config.decimal_handling_mode.clone()),
            ("key.converter", JSON_CONVERTER.to_string()),
            ("value.converter", JSON_CONVERTER.to_string()),
            ("key.converter.schemas.enable", "false".to_string()),
            ("value.converter.schemas.enable", "false".to_string()),
        ];

        Self {
            name: config.name.clone(),
            config: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    /// Look up a config value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }
}
