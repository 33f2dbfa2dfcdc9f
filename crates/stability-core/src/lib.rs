//! Core types for the stability harness.
//!
//! This crate provides the foundational types used across the harness,
//! including:
//!
//! - [`SqlType`] - the closed column type domain of the query engine
//! - [`GeneratedValue`] - one synthetic, typed value
//! - [`TableDescriptor`] / [`SchemaRegistry`] - tables loaded from DDL and a relation file
//! - [`ParameterMetadata`] - declared inputs of a prepared request
//! - [`RunIdentity`] - database and procedure names owned by one run
//!
//! # Architecture
//!
//! ```text
//! stability-core (this crate)
//!    │
//!    ├─── stability-generator  (values for tables and parameter sets)
//!    ├─── stability-engine     (query-engine client boundary)
//!    └─── stability-runner     (statements, provisioning, worker pools)
//! ```

pub mod ddl;
pub mod identity;
pub mod params;
pub mod relation;
pub mod schema;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use identity::RunIdentity;
pub use params::{ParameterColumn, ParameterMetadata};
pub use relation::{ColumnRef, KeyRelation, RelationConfig};
pub use schema::{ColumnDefinition, SchemaError, SchemaRegistry, TableDescriptor};
pub use types::{SqlType, UnsupportedTypeName};
pub use values::GeneratedValue;
