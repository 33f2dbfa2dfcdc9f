//! Relation file: which table is the main table and how tables join.
//!
//! ```yaml
//! main_table: flattenRequest
//! tables: [flattenRequest, action]   # optional, defaults to every DDL table
//! relations:
//!   - left: flattenRequest.reqId
//!     right: action.reqId
//! ```

use crate::schema::SchemaError;
use serde::{Deserialize, Serialize};

/// Parsed relation file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationConfig {
    /// Table driving read-path parameters and the procedure signature
    pub main_table: String,

    /// Subset of DDL tables taking part in the run (empty = all)
    #[serde(default)]
    pub tables: Vec<String>,

    /// Key relationships between tables
    #[serde(default)]
    pub relations: Vec<KeyRelation>,
}

impl RelationConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// A `table.column` reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ColumnRef(pub String);

impl ColumnRef {
    /// Split into `(table, column)`.
    pub fn split(&self) -> Result<(&str, &str), SchemaError> {
        match self.0.split_once('.') {
            Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                Ok((table.trim(), column.trim()))
            }
            _ => Err(SchemaError::InvalidReference(self.0.clone())),
        }
    }
}

/// Two columns that share a key across tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyRelation {
    pub left: ColumnRef,
    pub right: ColumnRef,
}
