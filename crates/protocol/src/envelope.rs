//! Change-event envelope
//!
//! Messages arrive either wrapped as `{"schema": ..., "payload": {...}}` or, with
//! the JSON converter's schemas disabled, as the bare payload object. A payload
//! carries an operation code plus `before` / `after` row images and a `source`
//! block with stream position metadata.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::ProtocolError;
use crate::snapshot::{Snapshot, SnapshotOptions};
use crate::Result;

/// Change operation code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `c` - row inserted
    Create,
    /// `u` - row updated
    Update,
    /// `r` - row read during the initial snapshot
    SnapshotRead,
    /// `d` - row deleted
    Delete,
}

impl Operation {
    /// Single-letter wire code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Create => "c",
            Self::Update => "u",
            Self::SnapshotRead => "r",
            Self::Delete => "d",
        }
    }

    /// Whether the operation writes the `after` image
    #[inline]
    pub fn is_upsert(&self) -> bool {
        !matches!(self, Self::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Operation {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "c" => Ok(Self::Create),
            "u" => Ok(Self::Update),
            "r" => Ok(Self::SnapshotRead),
            "d" => Ok(Self::Delete),
            other => Err(ProtocolError::unknown_operation(other)),
        }
    }
}

/// Stream position metadata from the payload's `source` block
///
/// Parsed leniently: any field that is absent or of the wrong type is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSource {
    /// Log sequence number of the change in the legacy store
    pub lsn: Option<u64>,
    /// Commit time in epoch milliseconds
    pub ts_ms: Option<i64>,
    /// Source table name
    pub table: Option<String>,
}

impl EventSource {
    fn from_json(value: Option<&Value>) -> Self {
        let Some(obj) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        Self {
            lsn: obj.get("lsn").and_then(Value::as_u64),
            ts_ms: obj.get("ts_ms").and_then(Value::as_i64),
            table: obj.get("table").and_then(Value::as_str).map(str::to_owned),
        }
    }
}

/// A decoded change event for one mirrored table
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<S> {
    Create { after: S, source: EventSource },
    Update { after: S, source: EventSource },
    SnapshotRead { after: S, source: EventSource },
    Delete { before: S, source: EventSource },
}

impl<S: Snapshot> ChangeEvent<S> {
    /// Decode a raw stream message
    ///
    /// Returns `Ok(None)` for messages that carry no payload (empty body,
    /// `{}`, `{"payload": null}`); these are skipped, not errors.
    pub fn decode(bytes: &[u8], options: &SnapshotOptions) -> Result<Option<Self>> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(&value, options)
    }

    /// Decode an already-parsed message
    pub fn from_value(value: &Value, options: &SnapshotOptions) -> Result<Option<Self>> {
        let Some(payload) = payload_of(value) else {
            return Ok(None);
        };

        let op: Operation = match payload.get("op") {
            Some(Value::String(code)) => code.parse()?,
            Some(Value::Null) | None => return Err(ProtocolError::MissingOperation),
            Some(other) => return Err(ProtocolError::unknown_operation(other.to_string())),
        };
        let source = EventSource::from_json(payload.get("source"));

        let event = match op {
            Operation::Delete => Self::Delete {
                before: image(payload, "before", options)?,
                source,
            },
            Operation::Create => Self::Create {
                after: image(payload, "after", options)?,
                source,
            },
            Operation::Update => Self::Update {
                after: image(payload, "after", options)?,
                source,
            },
            Operation::SnapshotRead => Self::SnapshotRead {
                after: image(payload, "after", options)?,
                source,
            },
        };
        Ok(Some(event))
    }

    /// Operation code of this event
    pub fn operation(&self) -> Operation {
        match self {
            Self::Create { .. } => Operation::Create,
            Self::Update { .. } => Operation::Update,
            Self::SnapshotRead { .. } => Operation::SnapshotRead,
            Self::Delete { .. } => Operation::Delete,
        }
    }

    /// Primary key of the affected row
    pub fn key(&self) -> i64 {
        self.snapshot().key()
    }

    /// Row image carried by the event (`after` for upserts, `before` for deletes)
    pub fn snapshot(&self) -> &S {
        match self {
            Self::Create { after, .. }
            | Self::Update { after, .. }
            | Self::SnapshotRead { after, .. } => after,
            Self::Delete { before, .. } => before,
        }
    }

    /// Source metadata
    pub fn source(&self) -> &EventSource {
        match self {
            Self::Create { source, .. }
            | Self::Update { source, .. }
            | Self::SnapshotRead { source, .. }
            | Self::Delete { source, .. } => source,
        }
    }

    /// Consume the event, returning the row image
    pub fn into_snapshot(self) -> S {
        match self {
            Self::Create { after, .. }
            | Self::Update { after, .. }
            | Self::SnapshotRead { after, .. } => after,
            Self::Delete { before, .. } => before,
        }
    }
}

/// Locate the payload object, unwrapping the schema envelope when present
fn payload_of(value: &Value) -> Option<&Map<String, Value>> {
    let obj = value.as_object()?;
    match obj.get("payload") {
        Some(payload) => payload.as_object(),
        // Bare payload: schemas disabled on the converter
        None if obj.contains_key("op") => Some(obj),
        None => None,
    }
}

fn image<S: Snapshot>(
    payload: &Map<String, Value>,
    name: &'static str,
    options: &SnapshotOptions,
) -> Result<S> {
    match payload.get(name) {
        Some(Value::Null) | None => Err(ProtocolError::MissingImage(name)),
        Some(value) => S::from_json(value, options),
    }
}
