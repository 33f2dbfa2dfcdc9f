//! Schema model for the stability harness.
//!
//! ## Type Hierarchy
//!
//! - `ColumnDefinition` - one column: position, name, type
//! - `TableDescriptor` - ordered columns plus key and timestamp positions
//! - `SchemaRegistry` - every table of a run, with one designated main table
//!
//! The registry is built once at startup from a relation file (YAML) and a DDL
//! file, and is read-only afterwards.

use crate::ddl::parse_ddl;
use crate::relation::{KeyRelation, RelationConfig};
use crate::types::SqlType;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading a schema file
    #[error("Failed to read schema file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing the relation YAML
    #[error("Failed to parse relation YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed DDL statement
    #[error("Invalid DDL: {0}")]
    Ddl(String),

    /// Column type outside of the supported domain
    #[error("Unsupported type '{type_name}' for column '{column}' in table '{table}'")]
    UnsupportedType {
        table: String,
        column: String,
        type_name: String,
    },

    /// Table not found in schema
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Table declared twice
    #[error("Duplicate table: {0}")]
    DuplicateTable(String),

    /// Column not found in table schema
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Position outside of the table's column range
    #[error("Position {position} out of range for table '{table}' with {columns} columns")]
    PositionOutOfRange {
        table: String,
        position: usize,
        columns: usize,
    },

    /// Index timestamp on a column that cannot hold one
    #[error("Column '{column}' in table '{table}' has type {column_type} and cannot be an index timestamp")]
    InvalidTimestampColumn {
        table: String,
        column: String,
        column_type: SqlType,
    },

    /// Malformed `table.column` reference in the relation file
    #[error("Invalid column reference '{0}', expected table.column")]
    InvalidReference(String),
}

// ============================================================================
// Columns and Tables
// ============================================================================

/// A single column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// 0-based position in the table
    pub position: usize,

    /// Column name
    pub name: String,

    /// Column type
    pub column_type: SqlType,
}

impl ColumnDefinition {
    pub fn new(position: usize, name: impl Into<String>, column_type: SqlType) -> Self {
        Self {
            position,
            name: name.into(),
            column_type,
        }
    }
}

/// Description of one table: ordered columns, key and timestamp positions.
///
/// Key and timestamp positions are always a subset of the column positions;
/// [`TableDescriptor::new`] rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    name: String,
    columns: Vec<ColumnDefinition>,
    key_positions: BTreeSet<usize>,
    timestamp_positions: BTreeSet<usize>,
    ddl: String,
}

impl TableDescriptor {
    /// Create a table descriptor.
    ///
    /// `columns` are given in table order; their positions are assigned from
    /// that order.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<(String, SqlType)>,
        key_positions: impl IntoIterator<Item = usize>,
        timestamp_positions: impl IntoIterator<Item = usize>,
        ddl: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let columns: Vec<ColumnDefinition> = columns
            .into_iter()
            .enumerate()
            .map(|(position, (col_name, ty))| ColumnDefinition::new(position, col_name, ty))
            .collect();

        let check = |position: usize| {
            if position < columns.len() {
                Ok(position)
            } else {
                Err(SchemaError::PositionOutOfRange {
                    table: name.clone(),
                    position,
                    columns: columns.len(),
                })
            }
        };
        let key_positions = key_positions
            .into_iter()
            .map(check)
            .collect::<Result<BTreeSet<_>, _>>()?;
        let timestamp_positions = timestamp_positions
            .into_iter()
            .map(check)
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            name,
            columns,
            key_positions,
            timestamp_positions,
            ddl: ddl.into(),
        })
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in table order.
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Positions that make up the table's index key.
    pub fn key_positions(&self) -> &BTreeSet<usize> {
        &self.key_positions
    }

    /// Positions marked as carrying the row timestamp.
    pub fn timestamp_positions(&self) -> &BTreeSet<usize> {
        &self.timestamp_positions
    }

    /// Whether the column at `position` carries the row timestamp.
    pub fn is_timestamp_position(&self, position: usize) -> bool {
        self.timestamp_positions.contains(&position)
    }

    /// The `CREATE TABLE` statement this table was declared with.
    pub fn ddl(&self) -> &str {
        &self.ddl
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Resolve a column name to its position.
    pub fn position_of(&self, column: &str) -> Result<usize, SchemaError> {
        self.get_column(column)
            .map(|c| c.position)
            .ok_or_else(|| SchemaError::ColumnNotFound {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Every table of a run, keyed by name, with one main table.
///
/// Iteration follows declaration order in the DDL file.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    tables: Vec<TableDescriptor>,
    table_map: HashMap<String, usize>,
    main_table: usize,
    relations: Vec<KeyRelation>,
}

impl SchemaRegistry {
    /// Build a registry from parsed tables.
    pub fn new(tables: Vec<TableDescriptor>, main_table: &str) -> Result<Self, SchemaError> {
        let mut table_map = HashMap::with_capacity(tables.len());
        for (idx, table) in tables.iter().enumerate() {
            if table_map.insert(table.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateTable(table.name.clone()));
            }
        }
        let main_table = *table_map
            .get(main_table)
            .ok_or_else(|| SchemaError::TableNotFound(main_table.to_string()))?;

        Ok(Self {
            tables,
            table_map,
            main_table,
            relations: Vec::new(),
        })
    }

    /// Attach inter-table key relationships, checking every reference.
    pub fn with_relations(mut self, relations: Vec<KeyRelation>) -> Result<Self, SchemaError> {
        for relation in &relations {
            for reference in [&relation.left, &relation.right] {
                let (table, column) = reference.split()?;
                self.get_table(table)
                    .ok_or_else(|| SchemaError::TableNotFound(table.to_string()))?
                    .position_of(column)?;
            }
        }
        self.relations = relations;
        Ok(self)
    }

    /// Build a registry from a relation YAML document and DDL text.
    pub fn from_sources(relation_yaml: &str, ddl: &str) -> Result<Self, SchemaError> {
        let relation = RelationConfig::from_yaml(relation_yaml)?;
        let mut tables = parse_ddl(ddl)?;

        if !relation.tables.is_empty() {
            for name in &relation.tables {
                if !tables.iter().any(|t| &t.name == name) {
                    return Err(SchemaError::TableNotFound(name.clone()));
                }
            }
            tables.retain(|t| relation.tables.contains(&t.name));
        }

        Self::new(tables, &relation.main_table)?.with_relations(relation.relations)
    }

    /// Load a registry from a relation file and a DDL file.
    pub fn from_files(
        relation_path: impl AsRef<Path>,
        ddl_path: impl AsRef<Path>,
    ) -> Result<Self, SchemaError> {
        let relation = read_file(relation_path.as_ref())?;
        let ddl = read_file(ddl_path.as_ref())?;
        Self::from_sources(&relation, &ddl)
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&TableDescriptor> {
        self.table_map.get(name).and_then(|&idx| self.tables.get(idx))
    }

    /// The table driving read-path parameters and the procedure shape.
    pub fn main_table(&self) -> &TableDescriptor {
        &self.tables[self.main_table]
    }

    /// All tables, in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.iter()
    }

    /// Table names, in declaration order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the registry has no tables. Never true for a built registry.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Key relationships between tables.
    pub fn relations(&self) -> &[KeyRelation] {
        &self.relations
    }

    /// Resolve main-table column names to positions.
    pub fn main_table_positions(&self, columns: &[String]) -> Result<Vec<usize>, SchemaError> {
        let main = self.main_table();
        columns.iter().map(|c| main.position_of(c.trim())).collect()
    }
}

fn read_file(path: &Path) -> Result<String, SchemaError> {
    fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.display().to_string(),
        source,
    })
}
