//! Connector status
//!
//! Interprets `GET /connectors/{name}/status`. A failed task outranks whatever
//! the connector itself reports, since a connector stays `RUNNING` while its
//! only task is dead.

use std::fmt;

use serde::Deserialize;

use crate::error::floor_char_boundary;

/// Longest failure trace kept
pub const MAX_TRACE_LEN: usize = 500;

/// Observed connector state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorStatus {
    Running,
    Paused,
    Unassigned,
    /// Connector or one of its tasks failed
    Failed { trace: String },
    /// Any other state string reported by the API
    Other(String),
    /// 404 - not registered
    Missing,
    /// REST API not reachable
    Unreachable(String),
    /// REST API answered with an unexpected status or body
    Error(String),
}

impl ConnectorStatus {
    /// Short label for logs
    pub fn label(&self) -> &str {
        match self {
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Unassigned => "UNASSIGNED",
            Self::Failed { .. } => "FAILED",
            Self::Other(state) => state,
            Self::Missing => "MISSING",
            Self::Unreachable(_) => "UNREACHABLE",
            Self::Error(_) => "ERROR",
        }
    }

    /// Interpret a 200 status body
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<StatusBody>(body) {
            Ok(parsed) => parsed.into_status(),
            Err(e) => Self::Error(format!("invalid status body: {}", e)),
        }
    }
}

impl fmt::Display for ConnectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    connector: StateEntry,
    #[serde(default)]
    tasks: Vec<StateEntry>,
}

#[derive(Debug, Deserialize)]
struct StateEntry {
    state: String,
    #[serde(default)]
    trace: Option<String>,
}

impl StatusBody {
    fn into_status(self) -> ConnectorStatus {
        if let Some(task) = self.tasks.iter().find(|t| t.state == "FAILED") {
            return ConnectorStatus::Failed {
                trace: truncate_trace(task.trace.as_deref()),
            };
        }

        match self.connector.state.as_str() {
            "RUNNING" => ConnectorStatus::Running,
            "PAUSED" => ConnectorStatus::Paused,
            "UNASSIGNED" => ConnectorStatus::Unassigned,
            "FAILED" => ConnectorStatus::Failed {
                trace: truncate_trace(self.connector.trace.as_deref()),
            },
            other => ConnectorStatus::Other(other.to_string()),
        }
    }
}

fn truncate_trace(trace: Option<&str>) -> String {
    let trace = trace.unwrap_or_default();
    trace[..floor_char_boundary(trace, MAX_TRACE_LEN)].to_string()
}
