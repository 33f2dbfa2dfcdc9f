//! Column types understood by the stability harness.
//!
//! `SqlType` is the closed type domain of the query engine's tables. Every
//! place where text turns into a type (DDL parsing, declared parameter types
//! reported by a prepared request) goes through [`SqlType::from_str`], so an
//! unknown type name is rejected at that boundary instead of being carried
//! around as a runtime fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column type of a table in the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    /// Variable-length string
    String,

    /// 32-bit floating point
    Float,

    /// 64-bit floating point
    Double,

    /// 32-bit signed integer
    Int,

    /// 64-bit signed integer
    BigInt,

    /// Boolean value
    Bool,

    /// Calendar date (YYYY-MM-DD)
    Date,

    /// Millisecond-precision timestamp
    Timestamp,
}

/// Error returned when a type name is outside of the supported domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported column type: {0}")]
pub struct UnsupportedTypeName(pub String);

impl SqlType {
    /// Every supported type, in declaration order.
    pub const ALL: [SqlType; 8] = [
        SqlType::String,
        SqlType::Float,
        SqlType::Double,
        SqlType::Int,
        SqlType::BigInt,
        SqlType::Bool,
        SqlType::Date,
        SqlType::Timestamp,
    ];

    /// Type name as it is written in DDL and procedure signatures.
    pub fn ddl_name(&self) -> &'static str {
        match self {
            SqlType::String => "string",
            SqlType::Float => "float",
            SqlType::Double => "double",
            SqlType::Int => "int",
            SqlType::BigInt => "bigint",
            SqlType::Bool => "bool",
            SqlType::Date => "date",
            SqlType::Timestamp => "timestamp",
        }
    }

    /// Whether a column of this type may carry an index timestamp.
    pub fn can_carry_timestamp(&self) -> bool {
        matches!(self, SqlType::BigInt | SqlType::Timestamp)
    }

    /// Whether values of this type are quoted in SQL text.
    pub fn is_quoted(&self) -> bool {
        matches!(self, SqlType::String | SqlType::Date)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ddl_name())
    }
}

impl FromStr for SqlType {
    type Err = UnsupportedTypeName;

    /// Accepts the engine's spellings case-insensitively, including the
    /// width-suffixed names used in result metadata (`int32`, `int64`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "varchar" | "text" => Ok(SqlType::String),
            "float" | "float32" => Ok(SqlType::Float),
            "double" | "float64" => Ok(SqlType::Double),
            "int" | "int32" | "integer" => Ok(SqlType::Int),
            "bigint" | "int64" | "long" => Ok(SqlType::BigInt),
            "bool" | "boolean" => Ok(SqlType::Bool),
            "date" => Ok(SqlType::Date),
            "timestamp" => Ok(SqlType::Timestamp),
            _ => Err(UnsupportedTypeName(s.trim().to_string())),
        }
    }
}
