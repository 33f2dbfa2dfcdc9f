//! In-process engine for dry runs and tests.
//!
//! Every call succeeds unless it contradicts what the engine has seen so far
//! (creating a database twice, writing into a database that was never
//! created). Statements are logged at `debug` and counted.

use crate::engine::{QueryEngine, QueryResult, RequestHandle, RequestKind, RowBuffer};
use crate::error::EngineError;
use async_trait::async_trait;
use stability_core::{GeneratedValue, ParameterMetadata};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Snapshot of the calls a [`DryRunEngine`] has served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DryRunStats {
    pub ddl_statements: u64,
    pub inserts: u64,
    pub executions: u64,
    pub rows_executed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    ddl_statements: AtomicU64,
    inserts: AtomicU64,
    executions: AtomicU64,
    rows_executed: AtomicU64,
}

/// Engine that accepts every well-formed call without any I/O.
///
/// Prepared requests report `request_schema` as their parameters, the same
/// shape the real engine reports for requests over the main table.
#[derive(Debug)]
pub struct DryRunEngine {
    request_schema: ParameterMetadata,
    databases: Mutex<HashSet<String>>,
    statements: Mutex<Vec<String>>,
    counters: Arc<Counters>,
}

impl DryRunEngine {
    pub fn new(request_schema: ParameterMetadata) -> Self {
        Self {
            request_schema,
            databases: Mutex::new(HashSet::new()),
            statements: Mutex::new(Vec::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Mark a database as existing, e.g. one created by an earlier run.
    pub fn with_database(self, name: impl Into<String>) -> Self {
        lock(&self.databases).insert(name.into());
        self
    }

    pub fn stats(&self) -> DryRunStats {
        DryRunStats {
            ddl_statements: self.counters.ddl_statements.load(Ordering::Relaxed),
            inserts: self.counters.inserts.load(Ordering::Relaxed),
            executions: self.counters.executions.load(Ordering::Relaxed),
            rows_executed: self.counters.rows_executed.load(Ordering::Relaxed),
        }
    }

    /// DDL statements executed so far, in order.
    pub fn ddl_log(&self) -> Vec<String> {
        lock(&self.statements).clone()
    }

    pub fn has_database(&self, name: &str) -> bool {
        lock(&self.databases).contains(name)
    }

    fn require_database(&self, name: &str) -> Result<(), EngineError> {
        if self.has_database(name) {
            Ok(())
        } else {
            Err(EngineError::DatabaseNotFound(name.to_string()))
        }
    }

    fn prepare(
        &self,
        database: &str,
        kind: RequestKind,
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        self.require_database(database)?;
        Ok(Box::new(DryRunRequest {
            kind,
            buffer: RowBuffer::new(self.request_schema.clone(), kind.is_batched()),
            counters: Arc::clone(&self.counters),
        }))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl QueryEngine for DryRunEngine {
    async fn create_database(&self, name: &str) -> Result<(), EngineError> {
        if !lock(&self.databases).insert(name.to_string()) {
            return Err(EngineError::DatabaseExists(name.to_string()));
        }
        debug!("[dry-run] create database {}", name);
        Ok(())
    }

    async fn drop_database(&self, name: &str) -> Result<(), EngineError> {
        if !lock(&self.databases).remove(name) {
            return Err(EngineError::DatabaseNotFound(name.to_string()));
        }
        debug!("[dry-run] drop database {}", name);
        Ok(())
    }

    async fn execute_ddl(&self, database: &str, statement: &str) -> Result<(), EngineError> {
        self.require_database(database)?;
        debug!("[dry-run] {}: {}", database, statement);
        lock(&self.statements).push(statement.to_string());
        self.counters.ddl_statements.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn execute_insert(&self, database: &str, statement: &str) -> Result<(), EngineError> {
        self.require_database(database)?;
        debug!("[dry-run] {}: {}", database, statement);
        self.counters.inserts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn prepare_request(
        &self,
        database: &str,
        _script: &str,
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        self.prepare(database, RequestKind::Request)
    }

    async fn prepare_batch_request(
        &self,
        database: &str,
        _script: &str,
        _common_column_positions: &[usize],
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        self.prepare(database, RequestKind::BatchRequest)
    }

    async fn prepare_procedure_call(
        &self,
        database: &str,
        _procedure: &str,
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        self.prepare(database, RequestKind::Procedure)
    }

    async fn prepare_batch_procedure_call(
        &self,
        database: &str,
        _procedure: &str,
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        self.prepare(database, RequestKind::BatchProcedure)
    }
}

struct DryRunRequest {
    kind: RequestKind,
    buffer: RowBuffer,
    counters: Arc<Counters>,
}

#[async_trait]
impl RequestHandle for DryRunRequest {
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
        let rows = self.buffer.take_rows()?;
        debug!("[dry-run] execute {} with {} rows", self.kind, rows.len());
        self.counters.executions.fetch_add(1, Ordering::Relaxed);
        self.counters
            .rows_executed
            .fetch_add(rows.len() as u64, Ordering::Relaxed);
        Ok(QueryResult { rows: rows.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DryRunEngine {
        DryRunEngine::new(ParameterMetadata::from_type_names(["string", "bigint"]))
    }

    #[tokio::test]
    async fn test_database_lifecycle() {
        let engine = engine();
        engine.create_database("db").await.unwrap();
        assert!(engine.has_database("db"));
        assert!(matches!(
            engine.create_database("db").await,
            Err(EngineError::DatabaseExists(_))
        ));

        engine.drop_database("db").await.unwrap();
        assert!(!engine.has_database("db"));
        assert!(matches!(
            engine.drop_database("db").await,
            Err(EngineError::DatabaseNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_statements_need_database() {
        let engine = engine();
        assert!(engine.execute_insert("missing", "INSERT").await.is_err());
        assert!(engine.prepare_request("missing", "SELECT 1").await.is_err());

        let engine = engine.with_database("db");
        engine.execute_ddl("db", "create table t (a string);").await.unwrap();
        engine.execute_insert("db", "INSERT INTO t VALUES ('a')").await.unwrap();

        assert_eq!(engine.ddl_log(), vec!["create table t (a string);"]);
        let stats = engine.stats();
        assert_eq!(stats.ddl_statements, 1);
        assert_eq!(stats.inserts, 1);
    }

    #[tokio::test]
    async fn test_batch_procedure_execution() {
        let engine = engine().with_database("db");
        let mut handle = engine
            .prepare_batch_procedure_call("db", "pname1")
            .await
            .unwrap();
        assert_eq!(handle.parameter_metadata().column_count(), 2);

        for i in 0..4 {
            handle.bind(0, GeneratedValue::String(format!("k{i}"))).unwrap();
            handle.bind(1, GeneratedValue::BigInt(i)).unwrap();
            handle.add_to_batch().unwrap();
        }
        let result = handle.execute().await.unwrap();

        assert_eq!(result.rows, 4);
        assert_eq!(engine.stats().executions, 1);
        assert_eq!(engine.stats().rows_executed, 4);
    }
}
