//! Generated values.
//!
//! A `GeneratedValue` lives for exactly one insert or one bound parameter
//! set: the generator produces it, the statement builder consumes it.

use crate::types::SqlType;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// One synthetic value, tagged with the column type it was generated for.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedValue {
    /// String value
    String(String),

    /// 32-bit floating point
    Float(f32),

    /// 64-bit floating point
    Double(f64),

    /// 32-bit signed integer
    Int(i32),

    /// 64-bit signed integer
    BigInt(i64),

    /// Boolean value
    Bool(bool),

    /// Calendar date
    Date(NaiveDate),

    /// Point in time, millisecond precision
    Timestamp(DateTime<Utc>),
}

impl GeneratedValue {
    /// The column type this value binds to.
    pub fn sql_type(&self) -> SqlType {
        match self {
            Self::String(_) => SqlType::String,
            Self::Float(_) => SqlType::Float,
            Self::Double(_) => SqlType::Double,
            Self::Int(_) => SqlType::Int,
            Self::BigInt(_) => SqlType::BigInt,
            Self::Bool(_) => SqlType::Bool,
            Self::Date(_) => SqlType::Date,
            Self::Timestamp(_) => SqlType::Timestamp,
        }
    }

    /// Try to get this value as an i64 (integers and timestamps in epoch millis).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i as i64),
            Self::BigInt(i) => Some(*i),
            Self::Timestamp(ts) => Some(ts.timestamp_millis()),
            _ => None,
        }
    }

    /// Render the value as a SQL literal for a textual `INSERT`.
    ///
    /// Strings and dates are single-quoted, everything else is bare.
    /// Timestamps are written as epoch milliseconds.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Float(f) => f.to_string(),
            Self::Double(d) => d.to_string(),
            Self::Int(i) => i.to_string(),
            Self::BigInt(i) => i.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Self::Timestamp(ts) => ts.timestamp_millis().to_string(),
        }
    }
}

impl fmt::Display for GeneratedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_literal())
    }
}
