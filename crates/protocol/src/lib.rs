//! ShadowMesh Protocol - Change-event wire types
//!
//! This crate decodes what the CDC connector puts on the change-event stream:
//! - `ChangeEvent` - Tagged create/update/snapshot-read/delete variant
//! - `ProductSnapshot` / `ReviewSnapshot` - Typed row images
//! - `SourceTable` - Which legacy table a stream mirrors
//! - `decimal` - Plain or base64 two's-complement decimal decoding
//!
//! # Design Principles
//!
//! - **Decode once**: Raw JSON is validated at the boundary and never accessed
//!   ad hoc downstream
//! - **Lenient fields, strict keys**: Missing optional fields default, a missing
//!   primary key is an error
//! - **Decimals never fail the message**: `decimal::decode` degrades to zero
//!
//! # Example
//!
//! ```
//! use shadowmesh_protocol::{ChangeEvent, ProductSnapshot, SnapshotOptions};
//!
//! let msg = br#"{"payload":{"op":"c","before":null,"after":{"id":7,"name":"Lamp","price":"12.50","stock":3}}}"#;
//! let event = ChangeEvent::<ProductSnapshot>::decode(msg, &SnapshotOptions::default())
//!     .unwrap()
//!     .expect("payload present");
//! assert_eq!(event.key(), 7);
//! ```

pub mod decimal;
mod envelope;
mod error;
mod snapshot;
mod table;

pub use envelope::{ChangeEvent, EventSource, Operation};
pub use error::{DecodeError, ProtocolError};
pub use snapshot::{ProductSnapshot, ReviewSnapshot, Snapshot, SnapshotOptions};
pub use table::SourceTable;

// Re-export Decimal so downstream crates agree on one version
pub use rust_decimal::Decimal;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Default scale of the legacy `price` column (NUMERIC(10,2))
pub const DEFAULT_PRICE_SCALE: u32 = 2;
