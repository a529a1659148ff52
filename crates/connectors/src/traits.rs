//! Connector control trait

use std::future::Future;

use crate::error::ConnectorError;
use crate::status::ConnectorStatus;

/// Result of a single successful registration call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterResponse {
    /// 200 / 201
    Created,
    /// 409 - a connector with this name is already registered
    AlreadyExists,
}

/// Control surface of a CDC connector
///
/// Implemented over HTTP by [`ConnectClient`](crate::ConnectClient); the
/// registrar and watchdog are generic over it.
pub trait ConnectorControl: Send + Sync {
    /// Connector name
    fn name(&self) -> &str;

    /// One registration attempt, no retry
    fn register(&self) -> impl Future<Output = Result<RegisterResponse, ConnectorError>> + Send;

    /// Current connector status; never fails, transport errors map to `Unreachable`
    fn status(&self) -> impl Future<Output = ConnectorStatus> + Send;

    /// Restart the connector
    fn restart(&self) -> impl Future<Output = Result<(), ConnectorError>> + Send;
}
