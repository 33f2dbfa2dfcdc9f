//! Command-line interface for the stability harness
//!
//! # Usage Examples
//!
//! ```bash
//! # Provision perf<millis>/pname<millis> and run until Ctrl-C
//! stability-harness run \
//!   --relation relation.yaml \
//!   --ddl ddl.sql \
//!   --script script.sql \
//!   --write-threads 2 --read-threads 4 \
//!   --request-ratio 0.5 --procedure-ratio 0.5 \
//!   --teardown-on-exit
//!
//! # Reuse an existing database and procedure
//! stability-harness run ... --skip-create --database perf1 --procedure pname1
//!
//! # Drop the tables and database of an earlier run
//! stability-harness teardown --relation relation.yaml --ddl ddl.sql --database perf1
//! ```
//!
//! Logging is controlled with `RUST_LOG`, e.g. `RUST_LOG=info`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use stability_core::SchemaRegistry;
use stability_harness::{connect, shutdown_signal, start, RunInputs};
use stability_runner::{teardown, EngineArgs, SchemaArgs, WorkloadArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stability-harness")]
#[command(about = "Keep a SQL query engine under continuous mixed read/write load")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision (unless skipped) and run the workload until interrupted
    Run {
        /// Schema and script locations
        #[command(flatten)]
        schema: SchemaArgs,

        /// Engine connection options
        #[command(flatten)]
        engine: EngineArgs,

        /// Workload shape
        #[command(flatten)]
        workload: WorkloadArgs,
    },

    /// Drop the tables and database of an earlier run
    Teardown {
        /// Path to the relation YAML file
        #[arg(long, env = "STABILITY_RELATION")]
        relation: PathBuf,

        /// Path to the DDL file
        #[arg(long, env = "STABILITY_DDL")]
        ddl: PathBuf,

        /// Database to drop
        #[arg(long)]
        database: String,

        /// Engine connection options
        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            schema,
            engine,
            workload,
        } => run_workload(schema, engine, workload).await,
        Commands::Teardown {
            relation,
            ddl,
            database,
            engine,
        } => {
            let registry = SchemaRegistry::from_files(&relation, &ddl).with_context(|| {
                format!("Failed to load schema from {relation:?} and {ddl:?}")
            })?;
            let client = connect(&engine, &registry, Some(database.as_str()));
            let report = teardown(client.as_ref(), &registry, &database)
                .await
                .context("Teardown failed")?;
            tracing::info!(
                "Teardown of {} complete: {} tables dropped, {} failed",
                database,
                report.dropped_tables.len(),
                report.failed_tables.len()
            );
            Ok(())
        }
    }
}

async fn run_workload(
    schema: SchemaArgs,
    engine_args: EngineArgs,
    workload: WorkloadArgs,
) -> anyhow::Result<()> {
    let settings = workload
        .settings()
        .context("Invalid workload configuration")?;
    let inputs = RunInputs::load(&schema)?;
    let identity = workload.identity();

    tracing::info!(
        "Run database {} procedure {} (pk_num={}, batch_size={})",
        identity.database(),
        identity.procedure(),
        settings.pk_num,
        settings.batch_size
    );

    let existing = (!settings.need_create).then(|| identity.database());
    let engine = connect(&engine_args, &inputs.registry, existing);
    let mut pools = start(engine.clone(), &inputs, &identity, settings).await?;

    tokio::select! {
        signal = shutdown_signal() => signal?,
        Some(result) = pools.join_next() => {
            // workers loop forever, so this is a panic
            if let Err(e) = result {
                tracing::error!("Worker stopped unexpectedly: {}", e);
            }
        }
    }
    pools.shutdown().await;

    if workload.teardown_on_exit {
        let report = teardown(engine.as_ref(), &inputs.registry, identity.database())
            .await
            .context("Teardown failed")?;
        tracing::info!(
            "Dropped {} tables ({} failed) and database {}",
            report.dropped_tables.len(),
            report.failed_tables.len(),
            identity.database()
        );
    }

    Ok(())
}
