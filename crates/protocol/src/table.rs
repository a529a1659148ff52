//! Source table identification
//!
//! `SourceTable` names the legacy table a change stream mirrors. Each table is
//! one logical sub-stream of the ingestion pipeline.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Legacy table mirrored by the pipeline
///
/// # Example
///
/// ```
/// use shadowmesh_protocol::SourceTable;
///
/// let table: SourceTable = "reviews".parse().unwrap();
/// assert_eq!(table.topic("monolith"), "monolith.public.reviews");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceTable {
    /// `public.products` → `pricing_inventory`
    Products,
    /// `public.reviews` → `reviews_replica`
    Reviews,
}

impl SourceTable {
    /// All mirrored tables
    pub const ALL: [SourceTable; 2] = [SourceTable::Products, SourceTable::Reviews];

    /// Table name in the legacy store
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Reviews => "reviews",
        }
    }

    /// Qualified name as listed in the connector's `table.include.list`
    pub fn qualified(&self) -> String {
        format!("public.{}", self.as_str())
    }

    /// Default change-stream topic for a connector topic prefix
    pub fn topic(&self, prefix: &str) -> String {
        format!("{}.public.{}", prefix, self.as_str())
    }
}

impl fmt::Display for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTable {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "products" | "public.products" => Ok(Self::Products),
            "reviews" | "public.reviews" => Ok(Self::Reviews),
            other => Err(ProtocolError::invalid_field(
                "table",
                format!("unknown table '{}'", other),
            )),
        }
    }
}
