//! Provisioning and worker pools for the stability harness.
//!
//! - [`provision`] - create the run's database, tables and procedure, and tear them down
//! - [`statement`] - textual inserts and bound parameter sets
//! - [`workload`] - writer and reader pools looping until the process stops
//! - [`args`] / [`settings`] - CLI arguments and the validated settings built from them

pub mod args;
pub mod error;
pub mod provision;
pub mod script;
pub mod settings;
pub mod statement;
pub mod workload;

pub use args::{EngineArgs, SchemaArgs, WorkloadArgs};
pub use error::{ConfigError, IterationError, ProvisionError};
pub use provision::{create_procedure_statement, provision, teardown, TeardownReport};
pub use script::{collapse_script, load_script};
pub use settings::WorkloadSettings;
pub use statement::{fill_batch, fill_single, insert_statement, BatchOutcome};
pub use workload::{pick_request_kind, RequestContext, WorkerPools, Workload};
