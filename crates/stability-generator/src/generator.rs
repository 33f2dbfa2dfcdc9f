//! Row and parameter-set generation.

use crate::generators::generate_value;
use chrono::Utc;
use rand::Rng;
use stability_core::{GeneratedValue, ParameterMetadata, SqlType, TableDescriptor};

/// Error type for generator operations.
///
/// Every variant is local to one row or parameter set: the caller logs it and
/// skips that row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// Declared type outside of the supported domain
    #[error("Unsupported type '{type_name}' at position {position}")]
    UnsupportedType { position: usize, type_name: String },

    /// Parameter metadata does not describe the target table
    #[error("Column count mismatch for table '{table}': schema has {expected}, metadata has {actual}")]
    ColumnCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// Seed value does not fit the column type
    #[error("Value {value} does not fit {sql_type} column at position {position}")]
    OutOfRange {
        position: usize,
        sql_type: SqlType,
        value: i64,
    },
}

/// The values shared by every column of one generated row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSeed {
    /// Entity id in `[0, PK_NUM)`
    pub entity_id: i64,
    /// Wall-clock time in epoch milliseconds
    pub timestamp_ms: i64,
}

impl RowSeed {
    pub fn new(entity_id: i64, timestamp_ms: i64) -> Self {
        Self {
            entity_id,
            timestamp_ms,
        }
    }

    /// Draw an entity id in `[0, pk_num)` and capture the current time.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R, pk_num: u32) -> Self {
        let entity_id = rng.random_range(0..pk_num.max(1)) as i64;
        Self::new(entity_id, Utc::now().timestamp_millis())
    }

    /// The number a numeric or timestamp column is built from.
    pub fn numeric_source(&self, timestamp_bearing: bool) -> i64 {
        if timestamp_bearing {
            self.timestamp_ms
        } else {
            self.entity_id
        }
    }
}

/// Produces typed rows for tables and typed parameter sets for prepared
/// requests.
///
/// The generator holds no mutable state; one instance is shared by all
/// workers, each of which brings its own RNG.
#[derive(Debug, Clone, Copy)]
pub struct RowGenerator {
    pk_num: u32,
}

impl RowGenerator {
    /// Create a generator drawing entity ids from `[0, pk_num)`.
    pub fn new(pk_num: u32) -> Self {
        Self { pk_num }
    }

    /// Draw the seed for one row.
    pub fn draw_seed<R: Rng + ?Sized>(&self, rng: &mut R) -> RowSeed {
        RowSeed::draw(rng, self.pk_num)
    }

    /// Generate one row for `table` in column order.
    pub fn generate_row(
        &self,
        table: &TableDescriptor,
        seed: &RowSeed,
    ) -> Result<Vec<GeneratedValue>, GenerateError> {
        table
            .columns()
            .iter()
            .map(|column| {
                generate_value(
                    column.column_type,
                    column.position,
                    seed,
                    table.is_timestamp_position(column.position),
                )
            })
            .collect()
    }

    /// Generate one parameter set for a prepared request over `table`.
    ///
    /// Types come from the request's declared parameters; timestamp marking
    /// comes from `table`. The whole set fails if the parameter count differs
    /// from the table's column count or any declared type is unsupported, so
    /// callers never bind a partial set.
    pub fn generate_parameters(
        &self,
        table: &TableDescriptor,
        metadata: &ParameterMetadata,
        seed: &RowSeed,
    ) -> Result<Vec<(usize, GeneratedValue)>, GenerateError> {
        if metadata.column_count() != table.column_count() {
            return Err(GenerateError::ColumnCountMismatch {
                table: table.name().to_string(),
                expected: table.column_count(),
                actual: metadata.column_count(),
            });
        }

        metadata
            .columns()
            .iter()
            .map(|param| {
                let sql_type: SqlType =
                    param
                        .type_name
                        .parse()
                        .map_err(|_| GenerateError::UnsupportedType {
                            position: param.position,
                            type_name: param.type_name.clone(),
                        })?;
                let value = generate_value(
                    sql_type,
                    param.position,
                    seed,
                    table.is_timestamp_position(param.position),
                )?;
                Ok((param.position, value))
            })
            .collect()
    }

    /// Draw a seed and generate one row.
    pub fn next_row<R: Rng + ?Sized>(
        &self,
        table: &TableDescriptor,
        rng: &mut R,
    ) -> Result<Vec<GeneratedValue>, GenerateError> {
        let seed = self.draw_seed(rng);
        self.generate_row(table, &seed)
    }

    /// Draw a seed and generate one parameter set.
    pub fn next_parameters<R: Rng + ?Sized>(
        &self,
        table: &TableDescriptor,
        metadata: &ParameterMetadata,
        rng: &mut R,
    ) -> Result<Vec<(usize, GeneratedValue)>, GenerateError> {
        let seed = self.draw_seed(rng);
        self.generate_parameters(table, metadata, &seed)
    }
}
