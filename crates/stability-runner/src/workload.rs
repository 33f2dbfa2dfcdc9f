//! Writer and reader worker pools.
//!
//! ```text
//!                 ┌──────────────── Workload (Arc-shared, immutable) ───────────────┐
//!                 │ engine · registry · request context · settings · generator     │
//!                 └──────────────┬───────────────────────────────┬─────────────────┘
//!                                │                               │
//!   writers (JoinSet)            ▼               readers (JoinSet)▼
//!   loop over every table:  generate row       pick kind → prepare → bind → execute
//!                           → INSERT           (handle dropped every iteration)
//! ```
//!
//! Workers never stop on their own. Every failure is logged and the loop
//! continues; the pools end only when [`WorkerPools::shutdown`] aborts them.

use crate::error::IterationError;
use crate::settings::WorkloadSettings;
use crate::statement::{fill_batch, fill_single, insert_statement};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stability_core::{RunIdentity, SchemaError, SchemaRegistry};
use stability_engine::{QueryEngine, QueryResult, RequestHandle, RequestKind};
use stability_generator::RowGenerator;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

/// What a read request runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub database: String,
    pub procedure: String,
    /// Query script, collapsed to one line
    pub script: String,
    /// Main-table positions shared by every row of a batched ad-hoc request
    pub common_column_positions: Vec<usize>,
}

impl RequestContext {
    /// Build the context for a run, resolving common column names against
    /// the main table.
    pub fn new(
        identity: &RunIdentity,
        registry: &SchemaRegistry,
        script: impl Into<String>,
        common_columns: &[String],
    ) -> Result<Self, SchemaError> {
        Ok(Self {
            database: identity.database().to_string(),
            procedure: identity.procedure().to_string(),
            script: script.into(),
            common_column_positions: registry.main_table_positions(common_columns)?,
        })
    }
}

/// Choose the shape of one read request.
///
/// Two independent uniform draws: the first above `request_ratio` makes the
/// request batched, the second above `procedure_ratio` routes it through the
/// procedure.
pub fn pick_request_kind<R: Rng + ?Sized>(
    rng: &mut R,
    request_ratio: f64,
    procedure_ratio: f64,
) -> RequestKind {
    let batched = rng.random::<f64>() > request_ratio;
    let procedure = rng.random::<f64>() > procedure_ratio;
    RequestKind::from_flags(batched, procedure)
}

/// Everything the workers share.
#[derive(Clone)]
pub struct Workload {
    engine: Arc<dyn QueryEngine>,
    registry: Arc<SchemaRegistry>,
    context: Arc<RequestContext>,
    settings: Arc<WorkloadSettings>,
    generator: RowGenerator,
}

impl Workload {
    pub fn new(
        engine: Arc<dyn QueryEngine>,
        registry: Arc<SchemaRegistry>,
        context: RequestContext,
        settings: WorkloadSettings,
    ) -> Self {
        let generator = RowGenerator::new(settings.pk_num);
        Self {
            engine,
            registry,
            context: Arc::new(context),
            settings: Arc::new(settings),
            generator,
        }
    }

    pub fn settings(&self) -> &WorkloadSettings {
        &self.settings
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Insert one generated row into every table, in registry order.
    ///
    /// Returns how many inserts succeeded. Failures are logged per table.
    pub async fn write_pass(&self, rng: &mut StdRng) -> usize {
        let mut inserted = 0;
        for table in self.registry.tables() {
            let statement = match self.generator.next_row(table, rng) {
                Ok(row) => insert_statement(table.name(), &row),
                Err(e) => {
                    warn!("Failed to generate row for {}: {}", table.name(), e);
                    continue;
                }
            };
            match self
                .engine
                .execute_insert(&self.context.database, &statement)
                .await
            {
                Ok(()) => inserted += 1,
                Err(e) => warn!("Insert into {} failed: {}", table.name(), e),
            }
        }
        inserted
    }

    /// Prepare, bind and execute one read request of the given kind.
    ///
    /// The prepared handle is dropped before returning, whatever the outcome.
    pub async fn read_iteration(
        &self,
        kind: RequestKind,
        rng: &mut StdRng,
    ) -> Result<QueryResult, IterationError> {
        let mut handle = self.prepare(kind).await?;
        let main = self.registry.main_table();

        if kind.is_batched() {
            let outcome = fill_batch(
                handle.as_mut(),
                main,
                &self.generator,
                rng,
                self.settings.batch_size,
            );
            debug!(
                "{} bound {}/{} rows",
                kind, outcome.added, outcome.attempts
            );
        } else {
            fill_single(handle.as_mut(), main, &self.generator, rng)?;
        }

        Ok(handle.execute().await?)
    }

    async fn prepare(&self, kind: RequestKind) -> Result<Box<dyn RequestHandle>, IterationError> {
        let ctx = &self.context;
        let handle = match kind {
            RequestKind::Request => self.engine.prepare_request(&ctx.database, &ctx.script).await?,
            RequestKind::BatchRequest => {
                self.engine
                    .prepare_batch_request(&ctx.database, &ctx.script, &ctx.common_column_positions)
                    .await?
            }
            RequestKind::Procedure => {
                self.engine
                    .prepare_procedure_call(&ctx.database, &ctx.procedure)
                    .await?
            }
            RequestKind::BatchProcedure => {
                self.engine
                    .prepare_batch_procedure_call(&ctx.database, &ctx.procedure)
                    .await?
            }
        };
        Ok(handle)
    }

    /// Writer loop. Never returns.
    pub async fn run_writer(self, worker: usize) {
        let mut rng = StdRng::from_os_rng();
        debug!("Writer {} started", worker);
        loop {
            self.write_pass(&mut rng).await;
            tokio::task::yield_now().await;
        }
    }

    /// Reader loop. Never returns.
    pub async fn run_reader(self, worker: usize) {
        let mut rng = StdRng::from_os_rng();
        debug!("Reader {} started", worker);
        loop {
            let kind = pick_request_kind(
                &mut rng,
                self.settings.request_ratio,
                self.settings.procedure_ratio,
            );
            if let Err(e) = self.read_iteration(kind, &mut rng).await {
                warn!("Reader {} {} failed: {}", worker, kind, e);
            }
            tokio::task::yield_now().await;
        }
    }

    /// Spawn both pools on the current runtime.
    pub fn start(&self) -> WorkerPools {
        let mut writers = JoinSet::new();
        for worker in 0..self.settings.write_threads {
            writers.spawn(self.clone().run_writer(worker));
        }
        let mut readers = JoinSet::new();
        for worker in 0..self.settings.read_threads {
            readers.spawn(self.clone().run_reader(worker));
        }
        info!(
            "Started {} writers and {} readers against {}",
            writers.len(),
            readers.len(),
            self.context.database
        );
        WorkerPools { writers, readers }
    }
}

/// Handles of the running worker tasks.
pub struct WorkerPools {
    writers: JoinSet<()>,
    readers: JoinSet<()>,
}

impl WorkerPools {
    pub fn writer_count(&self) -> usize {
        self.writers.len()
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Wait for the next worker to end. Workers only end by panicking or
    /// being aborted; `None` once both pools are empty.
    pub async fn join_next(&mut self) -> Option<Result<(), JoinError>> {
        tokio::select! {
            Some(result) = self.writers.join_next() => Some(result),
            Some(result) = self.readers.join_next() => Some(result),
            else => None,
        }
    }

    /// Abort every worker and wait for them to stop.
    pub async fn shutdown(mut self) {
        self.writers.abort_all();
        self.readers.abort_all();
        while self.join_next().await.is_some() {}
        info!("Worker pools stopped");
    }
}
