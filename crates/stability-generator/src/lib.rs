//! Synthetic value generator for the stability harness.
//!
//! The generator turns a table schema, or the declared parameters of a
//! prepared request, into one fully typed row. Values are not random per
//! column: every row draws one [`RowSeed`] (an entity id in `[0, PK_NUM)` and
//! the current wall-clock time) and all columns derive from it, so rows for
//! the same entity id line up across columns and tables.
//!
//! # Architecture
//!
//! ```text
//! TableDescriptor / ParameterMetadata
//!        │
//!        ▼
//! ┌─────────────────┐
//! │  RowGenerator   │◄── RowSeed { entity_id, timestamp_ms }
//! └────────┬────────┘
//!          │
//!          ▼
//!    Vec<GeneratedValue>
//! ```
//!
//! # Example
//!
//! ```rust
//! use stability_core::{SqlType, TableDescriptor, GeneratedValue};
//! use stability_generator::{RowGenerator, RowSeed};
//!
//! let table = TableDescriptor::new(
//!     "t",
//!     vec![("c0".to_string(), SqlType::String), ("c1".to_string(), SqlType::Int)],
//!     [0],
//!     [],
//!     "",
//! ).unwrap();
//!
//! let generator = RowGenerator::new(10);
//! let row = generator.generate_row(&table, &RowSeed::new(7, 0)).unwrap();
//! assert_eq!(row, vec![GeneratedValue::String("col0-7".into()), GeneratedValue::Int(7)]);
//! ```
//!
//! # Value rules
//!
//! - `string` - `col{position}-{entity_id}`
//! - `float` / `double` - fixed `1.3` / `1.4`
//! - `int` / `bigint` - the row timestamp on timestamp columns, else the entity id
//! - `timestamp` - the row timestamp on timestamp columns, else the entity id as epoch millis
//! - `bool` - `true`
//! - `date` - `2020-11-27`

pub mod generator;
pub mod generators;

// Re-exports for convenience
pub use generator::{GenerateError, RowGenerator, RowSeed};
