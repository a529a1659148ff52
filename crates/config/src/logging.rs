//! `[log]` section
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "json"
//! output = "/var/log/shadowmesh.log"
//!
//! [log.targets]
//! shadowmesh_pipeline = "debug"
//! sqlx = "warn"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const NAMES: [(&'static str, LogLevel); 5] = [
        ("trace", LogLevel::Trace),
        ("debug", LogLevel::Debug),
        ("info", LogLevel::Info),
        ("warn", LogLevel::Warn),
        ("error", LogLevel::Error),
    ];

    pub fn as_str(&self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, level)| level == self)
            .map_or("info", |(name, _)| *name)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = if wanted == "warning" { "warn" } else { wanted.as_str() };
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, level)| *level)
            .ok_or_else(|| format!("unknown log level '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Console,
    /// One JSON object per event, for log shippers
    Json,
}

/// Where log lines go; any other string is a file path, appended to
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    #[serde(untagged)]
    File(String),
}

impl LogOutput {
    /// Whether ANSI colors make sense for this destination
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::File(_))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,

    /// Per-target level overrides, e.g. `sqlx = "warn"`
    pub targets: BTreeMap<String, LogLevel>,
}

impl LogConfig {
    /// Filter directive for the subscriber
    ///
    /// A `--log-level` flag wins over `RUST_LOG`, which wins over this
    /// section. Either override is used verbatim, so full directives such as
    /// `shadowmesh_gateway=trace,info` work.
    pub fn filter_directive(&self, cli_level: Option<&str>, rust_log: Option<&str>) -> String {
        if let Some(directive) = cli_level.or(rust_log) {
            return directive.to_string();
        }

        let mut directive = self.level.as_str().to_string();
        for (target, level) in &self.targets {
            directive.push_str(&format!(",{}={}", target, level));
        }
        directive
    }
}
