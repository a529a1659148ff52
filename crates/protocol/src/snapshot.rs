//! Typed row images
//!
//! A change event carries `before` / `after` row images as loosely typed JSON.
//! Each mirrored table gets a snapshot struct that is decoded from that JSON
//! exactly once, coercing numbers that arrive as strings and defaulting
//! optional columns.

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::decimal;
use crate::error::ProtocolError;
use crate::table::SourceTable;
use crate::{DEFAULT_PRICE_SCALE, Result};

/// Options that influence snapshot decoding
#[derive(Debug, Clone, Copy)]
pub struct SnapshotOptions {
    /// Scale applied to base64-encoded `price` values
    pub price_scale: u32,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            price_scale: DEFAULT_PRICE_SCALE,
        }
    }
}

/// A row image decodable from a change-event snapshot
pub trait Snapshot: Sized {
    /// Table this snapshot mirrors
    const TABLE: SourceTable;

    /// Decode from the JSON row image
    fn from_json(value: &Value, options: &SnapshotOptions) -> Result<Self>;

    /// Primary key
    fn key(&self) -> i64;
}

/// Row image of `public.products`
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

impl Snapshot for ProductSnapshot {
    const TABLE: SourceTable = SourceTable::Products;

    fn from_json(value: &Value, options: &SnapshotOptions) -> Result<Self> {
        let row = as_row(value)?;

        // Absent price (e.g. a key-only delete image) is zero without a warning;
        // a present but malformed one goes through the logging fallback.
        let price = match row.get("price") {
            None | Some(Value::Null) => Decimal::ZERO,
            Some(raw) => decimal::decode(raw, options.price_scale),
        };

        Ok(Self {
            id: required_i64(row, "id")?,
            name: optional_string(row, "name").unwrap_or_default(),
            description: optional_string(row, "description"),
            price,
            stock: optional_i32(row, "stock")?.unwrap_or(0),
            image_url: optional_string(row, "image_url"),
            category: optional_string(row, "category"),
        })
    }

    #[inline]
    fn key(&self) -> i64 {
        self.id
    }
}

/// Row image of `public.reviews`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSnapshot {
    pub id: i64,
    pub product_id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
}

impl Snapshot for ReviewSnapshot {
    const TABLE: SourceTable = SourceTable::Reviews;

    fn from_json(value: &Value, _options: &SnapshotOptions) -> Result<Self> {
        let row = as_row(value)?;

        Ok(Self {
            id: required_i64(row, "id")?,
            product_id: optional_i64(row, "product_id")?.unwrap_or(0),
            user_id: optional_i64(row, "user_id")?,
            username: optional_string(row, "username"),
            rating: optional_i32(row, "rating")?.unwrap_or(0),
            comment: optional_string(row, "comment"),
        })
    }

    #[inline]
    fn key(&self) -> i64 {
        self.id
    }
}

// =============================================================================
// Field coercion
// =============================================================================

fn as_row(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ProtocolError::invalid_field("row", "row image is not a JSON object"))
}

fn required_i64(row: &Map<String, Value>, field: &'static str) -> Result<i64> {
    optional_i64(row, field)?.ok_or(ProtocolError::MissingField(field))
}

/// Coerce a number, integral float, or numeric string to `i64`
fn optional_i64(row: &Map<String, Value>, field: &'static str) -> Result<Option<i64>> {
    match row.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(Some(f as i64))
                }
                _ => Err(ProtocolError::invalid_field(field, format!("{} is not an integer", n))),
            }
        }
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| ProtocolError::invalid_field(field, format!("'{}': {}", s, e))),
        Some(other) => Err(ProtocolError::invalid_field(
            field,
            format!("expected integer, got {}", type_name(other)),
        )),
    }
}

fn optional_i32(row: &Map<String, Value>, field: &'static str) -> Result<Option<i32>> {
    optional_i64(row, field)?
        .map(|v| {
            i32::try_from(v)
                .map_err(|_| ProtocolError::invalid_field(field, format!("{} out of range", v)))
        })
        .transpose()
}

/// Strings pass through; scalars are stringified; null/absent is `None`
fn optional_string(row: &Map<String, Value>, field: &'static str) -> Option<String> {
    match row.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
