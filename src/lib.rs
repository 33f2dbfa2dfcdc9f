//! Stability harness
//!
//! Keeps a SQL query engine under continuous mixed load: writer workers
//! insert synthetic rows into every table of a schema while reader workers
//! issue single and batched requests, ad-hoc and through a registered
//! procedure. The run never ends on its own; it stops on Ctrl-C or SIGTERM.
//!
//! # Crates
//!
//! - `stability_core` - SQL types, generated values, schema registry, run identity
//! - `stability_generator` - deterministic rows and parameter sets from a row seed
//! - `stability_engine` - `QueryEngine` boundary with dry-run and API-server clients
//! - `stability_runner` - provisioning, statements and the worker pools
//!
//! # CLI Usage
//!
//! ```bash
//! # Provision a fresh database and run until interrupted
//! stability-harness run \
//!   --relation relation.yaml --ddl ddl.sql --script script.sql \
//!   --endpoint http://127.0.0.1:9080 \
//!   --write-threads 4 --read-threads 8
//!
//! # Exercise everything without an engine
//! stability-harness run --relation relation.yaml --ddl ddl.sql --script script.sql --dry-run
//!
//! # Drop what an earlier run created
//! stability-harness teardown --relation relation.yaml --ddl ddl.sql --database perf1606435200000
//! ```

use anyhow::Context;
use stability_core::{ParameterMetadata, RunIdentity, SchemaRegistry};
use stability_engine::{ApiServerEngine, DryRunEngine, QueryEngine};
use stability_runner::{
    load_script, provision, EngineArgs, RequestContext, SchemaArgs, WorkerPools, Workload,
    WorkloadSettings,
};
use std::sync::Arc;
use tracing::info;

/// Schema and script of a run, loaded once at startup.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub registry: Arc<SchemaRegistry>,
    /// Query script collapsed to one line
    pub script: String,
}

impl RunInputs {
    pub fn load(args: &SchemaArgs) -> anyhow::Result<Self> {
        let registry = SchemaRegistry::from_files(&args.relation, &args.ddl).with_context(|| {
            format!(
                "Failed to load schema from {:?} and {:?}",
                args.relation, args.ddl
            )
        })?;
        let script = load_script(&args.script)
            .with_context(|| format!("Failed to read script from {:?}", args.script))?;

        info!(
            "Loaded {} tables (main table {})",
            registry.len(),
            registry.main_table().name()
        );

        Ok(Self {
            registry: Arc::new(registry),
            script,
        })
    }
}

/// Build the engine client selected by `args`.
///
/// The dry-run engine reports the main table's columns as request
/// parameters. When provisioning is skipped it starts out knowing the run's
/// database, as a real engine would.
pub fn connect(
    args: &EngineArgs,
    registry: &SchemaRegistry,
    existing_database: Option<&str>,
) -> Arc<dyn QueryEngine> {
    if args.dry_run {
        info!("Using dry-run engine");
        Arc::new(dry_run_engine(registry, existing_database))
    } else {
        info!("Using API server at {}", args.endpoint);
        let request_schema = ParameterMetadata::from_table(registry.main_table());
        Arc::new(ApiServerEngine::new(&args.endpoint, request_schema))
    }
}

/// The in-process engine [`connect`] builds for `--dry-run`.
pub fn dry_run_engine(registry: &SchemaRegistry, existing_database: Option<&str>) -> DryRunEngine {
    let engine = DryRunEngine::new(ParameterMetadata::from_table(registry.main_table()));
    match existing_database {
        Some(database) => engine.with_database(database),
        None => engine,
    }
}

/// Provision when configured to, then start both worker pools.
pub async fn start(
    engine: Arc<dyn QueryEngine>,
    inputs: &RunInputs,
    identity: &RunIdentity,
    settings: WorkloadSettings,
) -> anyhow::Result<WorkerPools> {
    if settings.need_create {
        provision(engine.as_ref(), &inputs.registry, identity, &inputs.script)
            .await
            .context("Provisioning failed")?;
    } else {
        info!(
            "Skipping provisioning, using database {} and procedure {}",
            identity.database(),
            identity.procedure()
        );
    }

    let context = RequestContext::new(
        identity,
        &inputs.registry,
        inputs.script.clone(),
        &settings.common_columns,
    )
    .context("Invalid common columns")?;

    let workload = Workload::new(engine, Arc::clone(&inputs.registry), context, settings);
    Ok(workload.start())
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Failed to listen for Ctrl-C")?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("Received shutdown signal");
    Ok(())
}
