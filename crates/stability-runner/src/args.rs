//! CLI argument definitions for the stability harness.

use crate::error::ConfigError;
use crate::settings::WorkloadSettings;
use clap::Args;
use stability_core::identity::{DEFAULT_DATABASE_PREFIX, DEFAULT_PROCEDURE_PREFIX};
use stability_core::RunIdentity;
use std::path::PathBuf;

/// Locations of the schema and query script.
#[derive(Args, Clone, Debug)]
pub struct SchemaArgs {
    /// Path to the relation YAML file (main table and key relationships)
    #[arg(long, env = "STABILITY_RELATION")]
    pub relation: PathBuf,

    /// Path to the DDL file with one CREATE TABLE per table
    #[arg(long, env = "STABILITY_DDL")]
    pub ddl: PathBuf,

    /// Path to the query script used by requests and the procedure
    #[arg(long, env = "STABILITY_SCRIPT")]
    pub script: PathBuf,
}

/// Query engine connection options.
#[derive(Args, Clone, Debug)]
pub struct EngineArgs {
    /// Engine API server endpoint
    #[arg(long, default_value = "http://127.0.0.1:9080", env = "STABILITY_ENDPOINT")]
    pub endpoint: String,

    /// Dry-run mode: run against an in-process engine instead of the server
    #[arg(long)]
    pub dry_run: bool,
}

/// Workload shape.
#[derive(Args, Clone, Debug)]
pub struct WorkloadArgs {
    /// Number of writer tasks
    #[arg(long, default_value = "1", env = "STABILITY_WRITE_THREADS")]
    pub write_threads: usize,

    /// Number of reader tasks
    #[arg(long, default_value = "1", env = "STABILITY_READ_THREADS")]
    pub read_threads: usize,

    /// Parameter rows per batched request
    #[arg(long, default_value = "10", env = "STABILITY_BATCH_SIZE")]
    pub batch_size: usize,

    /// Upper bound (exclusive) of generated entity ids
    #[arg(long, default_value = "100000", env = "STABILITY_PK_NUM")]
    pub pk_num: u32,

    /// Share of single-row requests (the rest are batched)
    #[arg(long, default_value = "0.5", env = "STABILITY_REQUEST_RATIO")]
    pub request_ratio: f64,

    /// Share of ad-hoc requests (the rest are procedure calls)
    #[arg(long, default_value = "0.5", env = "STABILITY_PROCEDURE_RATIO")]
    pub procedure_ratio: f64,

    /// Skip provisioning and run against an existing database and procedure
    #[arg(long)]
    pub skip_create: bool,

    /// Main-table columns shared by every row of a batched request (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub common_columns: Vec<String>,

    /// Prefix of the generated database name
    #[arg(long, default_value = DEFAULT_DATABASE_PREFIX)]
    pub database_prefix: String,

    /// Prefix of the generated procedure name
    #[arg(long, default_value = DEFAULT_PROCEDURE_PREFIX)]
    pub procedure_prefix: String,

    /// Use this database instead of a generated name
    #[arg(long)]
    pub database: Option<String>,

    /// Use this procedure instead of a generated name
    #[arg(long)]
    pub procedure: Option<String>,

    /// Drop the tables and database when the harness is stopped
    #[arg(long)]
    pub teardown_on_exit: bool,
}

impl WorkloadArgs {
    /// Validated settings for the worker pools.
    pub fn settings(&self) -> Result<WorkloadSettings, ConfigError> {
        WorkloadSettings {
            write_threads: self.write_threads,
            read_threads: self.read_threads,
            batch_size: self.batch_size,
            pk_num: self.pk_num,
            request_ratio: self.request_ratio,
            procedure_ratio: self.procedure_ratio,
            need_create: !self.skip_create,
            common_columns: self
                .common_columns
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        }
        .validate()
    }

    /// The run's database and procedure names.
    pub fn identity(&self) -> RunIdentity {
        let mut identity = RunIdentity::new(&self.database_prefix, &self.procedure_prefix);
        if let Some(database) = &self.database {
            identity = identity.with_database(database);
        }
        if let Some(procedure) = &self.procedure {
            identity = identity.with_procedure(procedure);
        }
        identity
    }
}
