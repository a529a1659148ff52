//! ShadowMesh - Connectors
//!
//! Registration and supervision of the change-data-capture connector that
//! streams legacy-store changes into the ingestion pipeline.
//!
//! # Components
//!
//! - [`ConnectClient`] - Kafka Connect REST client (register, status, restart)
//! - [`ConnectorRegistrar`] - Bounded fixed-delay registration state machine
//! - [`ConnectorWatchdog`] - Periodic status check with re-register / restart
//!
//! # Design Principles
//!
//! - **Failure is a value**: Exhausted registration is an outcome, not a panic
//!   or a process exit
//! - **Testable without a clock**: State transitions are pure; only the driver
//!   sleeps
//! - **Generic control surface**: Registrar and watchdog work over any
//!   [`ConnectorControl`]
//!
//! # Example
//!
//! ```ignore
//! use shadowmesh_connectors::{ConnectClient, ConnectorRegistrar, RetryPolicy};
//!
//! let client = ConnectClient::from_config(&config.connector, &config.ingest.topic_prefix)?;
//! let registrar = ConnectorRegistrar::new(client, RetryPolicy::from(&config.connector));
//! let outcome = registrar.register(&cancel).await;
//! ```

mod client;
pub mod config;
mod error;
pub mod registrar;
mod status;
mod traits;
pub mod watchdog;

pub use client::ConnectClient;
pub use config::ConnectorDefinition;
pub use error::ConnectorError;
pub use registrar::{ConnectorRegistrar, RegistrationOutcome, RegistrationState, RetryPolicy};
pub use status::ConnectorStatus;
pub use traits::{ConnectorControl, RegisterResponse};
pub use watchdog::{ConnectorWatchdog, WatchdogAction, WatchdogMetrics};

#[cfg(test)]
mod client_test;
