//! Decimal column decoding
//!
//! The CDC connector emits NUMERIC columns either as a plain decimal string
//! (`decimal.handling.mode = string`) or as the base64 encoding of the
//! big-endian two's-complement unscaled integer (`precise` mode), with the
//! scale carried out of band. Both forms, and plain JSON numbers, decode here.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rust_decimal::Decimal;
use serde_json::{Number, Value};

use crate::error::DecodeError;

/// Widest unscaled integer accepted, in bytes
pub const MAX_UNSCALED_BYTES: usize = 16;

/// Largest scale a `Decimal` can carry
pub const MAX_SCALE: u32 = 28;

/// Decode a numeric column value, falling back to zero
///
/// Failures are logged and yield `Decimal::ZERO` so that a malformed number
/// never stops the ingestion loop.
pub fn decode(value: &Value, scale: u32) -> Decimal {
    match try_decode(value, scale) {
        Ok(decimal) => decimal,
        Err(e) => {
            tracing::warn!(
                error = %e,
                scale,
                "decimal decode failed, defaulting to zero"
            );
            Decimal::ZERO
        }
    }
}

/// Decode a numeric column value
///
/// # Order
///
/// 1. JSON numbers are returned as-is
/// 2. Strings that parse as a decimal literal, plain or in exponent form, are
///    returned as-is (scale ignored)
/// 3. Anything else is treated as base64 of a two's-complement integer and
///    divided by `10^scale`
pub fn try_decode(value: &Value, scale: u32) -> Result<Decimal, DecodeError> {
    match value {
        Value::Number(n) => from_number(n),
        Value::String(s) => decode_str(s, scale),
        Value::Null => Err(DecodeError::Empty),
        Value::Bool(_) => Err(DecodeError::UnsupportedType("bool")),
        Value::Array(_) => Err(DecodeError::UnsupportedType("array")),
        Value::Object(_) => Err(DecodeError::UnsupportedType("object")),
    }
}

/// Decode a string column value (decimal literal, exponent form or base64)
pub fn decode_str(input: &str, scale: u32) -> Result<Decimal, DecodeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }

    if let Ok(decimal) = Decimal::from_str(trimmed) {
        return Ok(decimal);
    }
    // `1E+2` is also valid base64; the numeric reading wins
    if trimmed.contains(['e', 'E'])
        && let Ok(decimal) = Decimal::from_scientific(trimmed)
    {
        return Ok(decimal);
    }

    let bytes = STANDARD
        .decode(trimmed)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;
    let unscaled = unscaled_from_be_bytes(&bytes)?;
    apply_scale(unscaled, scale)
}

/// Rebuild a signed integer from big-endian two's-complement bytes
///
/// Bytes are shifted in most-significant first; when the top bit of the first
/// byte is set the result is shifted down by `2^(8 * len)`.
pub fn unscaled_from_be_bytes(bytes: &[u8]) -> Result<i128, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    if bytes.len() > MAX_UNSCALED_BYTES {
        return Err(DecodeError::TooWide(bytes.len()));
    }

    let acc = bytes
        .iter()
        .fold(0u128, |acc, &b| (acc << 8) | u128::from(b));
    let negative = bytes[0] & 0x80 != 0;
    let bits = 8 * bytes.len() as u32;

    // A full 16-byte value already is its two's-complement i128
    if bits == 128 {
        return Ok(acc as i128);
    }

    let value = acc as i128;
    Ok(if negative { value - (1i128 << bits) } else { value })
}

/// Divide an unscaled integer by `10^scale`
pub fn apply_scale(unscaled: i128, scale: u32) -> Result<Decimal, DecodeError> {
    if scale > MAX_SCALE {
        return Err(DecodeError::ScaleTooLarge(scale));
    }
    Decimal::try_from_i128_with_scale(unscaled, scale).map_err(|_| DecodeError::OutOfRange)
}

fn from_number(n: &Number) -> Result<Decimal, DecodeError> {
    if let Some(i) = n.as_i64() {
        return Ok(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Decimal::from(u));
    }

    let repr = n.to_string();
    Decimal::from_str(&repr)
        .or_else(|_| Decimal::from_scientific(&repr))
        .map_err(|_| DecodeError::OutOfRange)
}
