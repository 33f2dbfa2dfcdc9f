//! Error types for the runner.

use stability_engine::EngineError;
use stability_generator::GenerateError;
use thiserror::Error;

/// Invalid workload configuration. Fatal before any worker starts.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    /// Ratio outside `[0, 1]`.
    #[error("{name} must be within [0, 1], got {value}")]
    Ratio { name: &'static str, value: f64 },

    /// Count that must be positive.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// Entity-id bound larger than an `int` column can hold.
    #[error("pk_num must not exceed {max}, got {value}")]
    PkNumTooLarge { value: u32, max: u32 },
}

/// Provisioning failure. Aborts the run; nothing is rolled back.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Failed to create database {database}: {source}")]
    CreateDatabase {
        database: String,
        #[source]
        source: EngineError,
    },

    #[error("Failed to create table {table}: {source}")]
    CreateTable {
        table: String,
        #[source]
        source: EngineError,
    },

    #[error("Failed to create procedure {procedure}: {source}")]
    CreateProcedure {
        procedure: String,
        #[source]
        source: EngineError,
    },

    #[error("Failed to drop database {database}: {source}")]
    DropDatabase {
        database: String,
        #[source]
        source: EngineError,
    },
}

/// Failure of one worker iteration. Logged by the worker, never fatal.
#[derive(Error, Debug)]
pub enum IterationError {
    #[error("Generation error: {0}")]
    Generate(#[from] GenerateError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}
