//! Query-engine client boundary for the stability harness.
//!
//! The workload only talks to the engine through [`QueryEngine`] and the
//! [`RequestHandle`]s it prepares. Two clients are provided:
//!
//! - [`ApiServerEngine`] - HTTP client for an engine API server
//! - [`DryRunEngine`] - in-process engine that accepts everything and counts calls
//!
//! # Example
//!
//! ```rust,no_run
//! use stability_core::ParameterMetadata;
//! use stability_engine::{DryRunEngine, QueryEngine};
//!
//! # async fn run() -> Result<(), stability_engine::EngineError> {
//! let engine = DryRunEngine::new(ParameterMetadata::from_type_names(["string", "int"]));
//! engine.create_database("perf1").await?;
//! engine.execute_insert("perf1", "INSERT INTO t VALUES ('col0-7', 7)").await?;
//! # Ok(())
//! # }
//! ```

pub mod api_server;
pub mod dry_run;
pub mod engine;
pub mod error;

pub use api_server::ApiServerEngine;
pub use dry_run::{DryRunEngine, DryRunStats};
pub use engine::{QueryEngine, QueryResult, RequestHandle, RequestKind, RowBuffer};
pub use error::EngineError;
