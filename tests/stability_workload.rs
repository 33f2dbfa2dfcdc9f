//! End-to-end runs of the harness against in-process engines.

use async_trait::async_trait;
use stability_core::{GeneratedValue, ParameterMetadata, RunIdentity, SchemaRegistry};
use stability_engine::{
    DryRunEngine, EngineError, QueryEngine, QueryResult, RequestHandle, RowBuffer,
};
use stability_harness::{connect, dry_run_engine, start, RunInputs};
use stability_runner::{EngineArgs, SchemaArgs, WorkloadSettings};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

const RELATION: &str = r#"
main_table: flattenRequest
relations:
  - left: flattenRequest.reqId
    right: action.reqId
"#;

const DDL: &str = r#"
create table flattenRequest (
    reqId string,
    eventTime timestamp,
    main_id bigint,
    amount double,
    flag bool,
    index(key=reqId, ts=eventTime)
);
create table action (
    reqId string,
    actionValue int,
    ts bigint,
    index(key=reqId, ts=ts)
);
"#;

const SCRIPT: &str = "select reqId, sum(amount) over w as total\n\
                      from flattenRequest\n\
                      window w as (partition by reqId order by eventTime rows between 10 preceding and current row);\n";

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

struct Files {
    relation: NamedTempFile,
    ddl: NamedTempFile,
    script: NamedTempFile,
}

impl Files {
    fn new() -> Self {
        Self {
            relation: write_temp(RELATION),
            ddl: write_temp(DDL),
            script: write_temp(SCRIPT),
        }
    }

    fn schema_args(&self) -> SchemaArgs {
        SchemaArgs {
            relation: self.relation.path().to_path_buf(),
            ddl: self.ddl.path().to_path_buf(),
            script: self.script.path().to_path_buf(),
        }
    }
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    while !done() {
        tokio::task::yield_now().await;
    }
}

#[test]
fn test_load_inputs() {
    let files = Files::new();
    let inputs = RunInputs::load(&files.schema_args()).unwrap();

    assert_eq!(inputs.registry.table_names(), vec!["flattenRequest", "action"]);
    assert_eq!(inputs.registry.relations().len(), 1);
    assert!(!inputs.script.contains('\n'));
    assert!(inputs.script.starts_with("select reqId"));
}

#[test]
fn test_load_inputs_missing_file() {
    let files = Files::new();
    let mut args = files.schema_args();
    args.ddl = "/nonexistent/ddl.sql".into();
    assert!(RunInputs::load(&args).is_err());
}

#[test]
fn test_demo_inputs_load() {
    let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
    let inputs = RunInputs::load(&SchemaArgs {
        relation: demos.join("relation.yaml"),
        ddl: demos.join("ddl.sql"),
        script: demos.join("script.sql"),
    })
    .unwrap();

    assert_eq!(inputs.registry.len(), 3);
    assert_eq!(inputs.registry.main_table().column_count(), 8);
    assert!(inputs.registry.main_table().is_timestamp_position(1));
}

#[tokio::test]
async fn test_dry_run_provisions_and_runs() {
    let files = Files::new();
    let inputs = RunInputs::load(&files.schema_args()).unwrap();
    let identity = RunIdentity::at("perf", "pname", 1_606_435_200_000);
    let engine = Arc::new(DryRunEngine::new(ParameterMetadata::from_table(
        inputs.registry.main_table(),
    )));

    let settings = WorkloadSettings {
        write_threads: 2,
        read_threads: 2,
        batch_size: 3,
        common_columns: vec!["reqId".into()],
        ..Default::default()
    };
    let pools = start(engine.clone(), &inputs, &identity, settings)
        .await
        .unwrap();

    let log = engine.ddl_log();
    assert!(engine.has_database("perf1606435200000"));
    assert_eq!(log.len(), 3);
    assert!(log[2].starts_with(
        "CREATE PROCEDURE pname1606435200000(reqId string, eventTime timestamp, main_id bigint, amount double, flag bool) BEGIN select reqId"
    ));

    wait_until(|| {
        let stats = engine.stats();
        stats.inserts >= 20 && stats.executions >= 20
    })
    .await;
    pools.shutdown().await;
}

#[tokio::test]
async fn test_skip_create_uses_existing_database() {
    let files = Files::new();
    let inputs = RunInputs::load(&files.schema_args()).unwrap();
    let identity = RunIdentity::at("perf", "pname", 1)
        .with_database("existing")
        .with_procedure("existing_proc");
    let engine = Arc::new(dry_run_engine(&inputs.registry, Some(identity.database())));

    let settings = WorkloadSettings {
        need_create: false,
        ..Default::default()
    };
    let pools = start(engine.clone(), &inputs, &identity, settings)
        .await
        .unwrap();

    // one writer and one reader keep iterating against the existing database
    wait_until(|| {
        let stats = engine.stats();
        stats.inserts >= 20 && stats.executions >= 20
    })
    .await;
    pools.shutdown().await;

    assert!(engine.ddl_log().is_empty());
    assert!(engine.has_database("existing"));
    assert!(!engine.has_database("perf1"));
}

#[tokio::test]
async fn test_connect_dry_run_knows_existing_database() {
    let files = Files::new();
    let inputs = RunInputs::load(&files.schema_args()).unwrap();
    let args = EngineArgs {
        endpoint: String::new(),
        dry_run: true,
    };

    let engine = connect(&args, &inputs.registry, Some("existing"));
    assert!(matches!(
        engine.create_database("existing").await,
        Err(EngineError::DatabaseExists(_))
    ));
    engine
        .execute_insert("existing", "INSERT INTO action VALUES ('a', 1, 1, 1)")
        .await
        .unwrap();

    let engine = connect(&args, &inputs.registry, None);
    assert!(engine.create_database("existing").await.is_ok());
}

#[tokio::test]
async fn test_provision_failure_is_fatal() {
    let files = Files::new();
    let inputs = RunInputs::load(&files.schema_args()).unwrap();
    let identity = RunIdentity::at("perf", "pname", 1);
    let engine = Arc::new(
        DryRunEngine::new(ParameterMetadata::from_table(inputs.registry.main_table()))
            .with_database(identity.database()),
    );

    let result = start(engine.clone(), &inputs, &identity, WorkloadSettings::default()).await;
    assert!(result.is_err());
    assert_eq!(engine.stats().inserts, 0);
}

#[tokio::test]
async fn test_unknown_common_column_is_fatal() {
    let files = Files::new();
    let inputs = RunInputs::load(&files.schema_args()).unwrap();
    let identity = RunIdentity::at("perf", "pname", 1);
    let engine = Arc::new(DryRunEngine::new(ParameterMetadata::from_table(
        inputs.registry.main_table(),
    )));

    let settings = WorkloadSettings {
        common_columns: vec!["missing".into()],
        ..Default::default()
    };
    assert!(start(engine, &inputs, &identity, settings).await.is_err());
}

/// Engine whose inserts and executions always fail, counting every attempt.
struct FailingEngine {
    inner: DryRunEngine,
    request_schema: ParameterMetadata,
    insert_attempts: AtomicU64,
    execute_attempts: Arc<AtomicU64>,
}

impl FailingEngine {
    fn new(registry: &SchemaRegistry, database: &str) -> Self {
        let request_schema = ParameterMetadata::from_table(registry.main_table());
        Self {
            inner: DryRunEngine::new(request_schema.clone()).with_database(database),
            request_schema,
            insert_attempts: AtomicU64::new(0),
            execute_attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    fn handle(&self, batched: bool) -> Box<dyn RequestHandle> {
        Box::new(FailingHandle {
            buffer: RowBuffer::new(self.request_schema.clone(), batched),
            attempts: Arc::clone(&self.execute_attempts),
        })
    }
}

#[async_trait]
impl QueryEngine for FailingEngine {
    async fn create_database(&self, name: &str) -> Result<(), EngineError> {
        self.inner.create_database(name).await
    }

    async fn drop_database(&self, name: &str) -> Result<(), EngineError> {
        self.inner.drop_database(name).await
    }

    async fn execute_ddl(&self, database: &str, statement: &str) -> Result<(), EngineError> {
        self.inner.execute_ddl(database, statement).await
    }

    async fn execute_insert(&self, _database: &str, _statement: &str) -> Result<(), EngineError> {
        self.insert_attempts.fetch_add(1, Ordering::Relaxed);
        Err(EngineError::Rejected {
            code: -1,
            message: "tablet unavailable".into(),
        })
    }

    async fn prepare_request(
        &self,
        _database: &str,
        _script: &str,
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        Ok(self.handle(false))
    }

    async fn prepare_batch_request(
        &self,
        _database: &str,
        _script: &str,
        _common_column_positions: &[usize],
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        Ok(self.handle(true))
    }

    async fn prepare_procedure_call(
        &self,
        _database: &str,
        _procedure: &str,
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        Ok(self.handle(false))
    }

    async fn prepare_batch_procedure_call(
        &self,
        _database: &str,
        _procedure: &str,
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        Ok(self.handle(true))
    }
}

struct FailingHandle {
    buffer: RowBuffer,
    attempts: Arc<AtomicU64>,
}

#[async_trait]
impl RequestHandle for FailingHandle {
    fn parameter_metadata(&self) -> &ParameterMetadata {
        self.buffer.metadata()
    }

    fn bind(&mut self, position: usize, value: GeneratedValue) -> Result<(), EngineError> {
        self.buffer.bind(position, value)
    }

    fn add_to_batch(&mut self) -> Result<(), EngineError> {
        self.buffer.add_to_batch()
    }

    async fn execute(&mut self) -> Result<QueryResult, EngineError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(EngineError::Rejected {
            code: -1,
            message: "request timed out".into(),
        })
    }
}

#[tokio::test]
async fn test_failing_engine_keeps_workers_running() {
    let files = Files::new();
    let inputs = RunInputs::load(&files.schema_args()).unwrap();
    let identity = RunIdentity::at("perf", "pname", 1);
    let engine = Arc::new(FailingEngine::new(&inputs.registry, identity.database()));

    let settings = WorkloadSettings {
        need_create: false,
        ..Default::default()
    };
    let pools = start(engine.clone(), &inputs, &identity, settings)
        .await
        .unwrap();

    // every insert and execution fails, yet both loops keep going
    wait_until(|| {
        engine.insert_attempts.load(Ordering::Relaxed) >= 50
            && engine.execute_attempts.load(Ordering::Relaxed) >= 50
    })
    .await;

    assert_eq!(pools.writer_count(), 1);
    assert_eq!(pools.reader_count(), 1);
    pools.shutdown().await;
}
