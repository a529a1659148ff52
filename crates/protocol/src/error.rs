//! Protocol error types
//!
//! Errors that can occur when decoding change events.

use thiserror::Error;

/// Errors that can occur while decoding a change-event message
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Message body is not valid JSON (or not the expected shape)
    #[error("invalid change event JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Operation code is not one of c/u/r/d
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Payload has no operation code
    #[error("payload is missing the 'op' field")]
    MissingOperation,

    /// The row image required by the operation is absent
    #[error("missing '{0}' row image")]
    MissingImage(&'static str),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Field is present but cannot be coerced to the expected type
    #[error("invalid value for field '{field}': {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}

impl ProtocolError {
    /// Create an unknown operation error
    #[inline]
    pub fn unknown_operation(op: impl Into<String>) -> Self {
        Self::UnknownOperation(op.into())
    }

    /// Create a missing field error
    #[inline]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField(field)
    }

    /// Create an invalid field error
    #[inline]
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }
}

/// Errors from decoding a numeric column value
///
/// These never escape `decimal::decode`, which logs them and yields zero.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Null or empty string
    #[error("empty decimal input")]
    Empty,

    /// JSON type that cannot carry a number (bool, array, object)
    #[error("unsupported decimal value type: {0}")]
    UnsupportedType(&'static str),

    /// Not a decimal literal and not valid base64
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    /// Unscaled integer wider than 128 bits
    #[error("unscaled value is {0} bytes, at most 16 are supported")]
    TooWide(usize),

    /// Scale beyond what `Decimal` can represent
    #[error("scale {0} exceeds the maximum of 28")]
    ScaleTooLarge(u32),

    /// Value does not fit in a 96-bit decimal mantissa
    #[error("value out of decimal range")]
    OutOfRange,
}
