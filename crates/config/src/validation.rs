//! Configuration validation
//!
//! Checks values that serde cannot:
//! - Log target names are usable in a filter directive
//! - Traffic weight within 0..=100
//! - Backend and database URLs are well formed when present
//! - Timeouts and intervals are non-zero
//! - Price scale fits a decimal
//!
//! Required URLs are checked per command (`Config::require_gateway` and friends)
//! so `shadowmesh register` does not demand a gateway section.

use std::time::Duration;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Largest scale a decimal value can carry
const MAX_PRICE_SCALE: u32 = 28;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_log(config)?;
    validate_gateway(config)?;
    validate_ingest(config)?;
    validate_replica(config)?;
    validate_connector(config)?;
    Ok(())
}

fn validate_log(config: &Config) -> Result<()> {
    if let Some(target) = config
        .log
        .targets
        .keys()
        .find(|t| t.is_empty() || t.contains([',', '=', ' ']))
    {
        return Err(ConfigError::invalid_value(
            "log",
            "targets",
            format!("'{}' is not a valid target name", target),
        ));
    }
    Ok(())
}

fn validate_gateway(config: &Config) -> Result<()> {
    let gateway = &config.gateway;

    if gateway.initial_weight > 100 {
        return Err(ConfigError::invalid_value(
            "gateway",
            "initial_weight",
            format!("{} is outside 0..=100", gateway.initial_weight),
        ));
    }
    check_http_url("gateway", "legacy_url", &gateway.legacy_url)?;
    check_http_url("gateway", "replica_url", &gateway.replica_url)?;
    check_non_zero("gateway", "request_timeout", gateway.request_timeout)?;
    check_non_zero("gateway", "health_timeout", gateway.health_timeout)?;
    Ok(())
}

fn validate_ingest(config: &Config) -> Result<()> {
    let ingest = &config.ingest;

    check_postgres_url("ingest", "replica_db_url", &ingest.replica_db_url)?;
    if ingest.max_connections == 0 {
        return Err(ConfigError::invalid_value(
            "ingest",
            "max_connections",
            "must be at least 1",
        ));
    }
    if ingest.price_scale > MAX_PRICE_SCALE {
        return Err(ConfigError::invalid_value(
            "ingest",
            "price_scale",
            format!("{} exceeds {}", ingest.price_scale, MAX_PRICE_SCALE),
        ));
    }
    if ingest.topic_prefix.is_empty() {
        return Err(ConfigError::missing_field("ingest", "topic_prefix"));
    }
    check_non_zero("ingest", "metrics_interval", ingest.metrics_interval)?;
    Ok(())
}

fn validate_replica(config: &Config) -> Result<()> {
    let replica = &config.replica;

    check_postgres_url("replica", "database_url", &replica.database_url)?;
    if replica.max_connections == 0 {
        return Err(ConfigError::invalid_value(
            "replica",
            "max_connections",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_connector(config: &Config) -> Result<()> {
    let connector = &config.connector;

    check_http_url("connector", "connect_url", &connector.connect_url)?;
    if connector.name.is_empty() {
        return Err(ConfigError::missing_field("connector", "name"));
    }
    if connector.tables.is_empty() {
        return Err(ConfigError::missing_field("connector", "tables"));
    }
    if connector.max_attempts == 0 {
        return Err(ConfigError::invalid_value(
            "connector",
            "max_attempts",
            "must be at least 1",
        ));
    }
    if !matches!(connector.decimal_handling_mode.as_str(), "string" | "precise") {
        return Err(ConfigError::invalid_value(
            "connector",
            "decimal_handling_mode",
            format!("'{}' is not 'string' or 'precise'", connector.decimal_handling_mode),
        ));
    }
    check_non_zero("connector", "request_timeout", connector.request_timeout)?;
    check_non_zero("connector", "watchdog_interval", connector.watchdog_interval)?;
    Ok(())
}

/// Empty is allowed here; presence is checked by the command that needs it
fn check_http_url(section: &'static str, field: &'static str, url: &str) -> Result<()> {
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(
            section,
            field,
            format!("'{}' must start with http:// or https://", url),
        ))
    }
}

fn check_postgres_url(section: &'static str, field: &'static str, url: &str) -> Result<()> {
    if url.is_empty() || url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(section, field, "must be a postgres:// URL"))
    }
}

fn check_non_zero(section: &'static str, field: &'static str, value: Duration) -> Result<()> {
    if value.is_zero() {
        Err(ConfigError::invalid_value(section, field, "must be non-zero"))
    } else {
        Ok(())
    }
}
