//! Configuration errors

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A command needs a field that has no usable default
    #[error("[{section}] {field} must be set")]
    MissingField {
        section: &'static str,
        field: &'static str,
    },

    #[error("[{section}] {field}: {message}")]
    InvalidValue {
        section: &'static str,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    pub fn missing_field(section: &'static str, field: &'static str) -> Self {
        Self::MissingField { section, field }
    }

    pub fn invalid_value(
        section: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section,
            field,
            message: message.into(),
        }
    }

    /// Config section the error belongs to, if any
    pub fn section(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { section, .. } | Self::InvalidValue { section, .. } => {
                Some(section)
            }
            Self::Read { .. } | Self::Parse(_) => None,
        }
    }
}
