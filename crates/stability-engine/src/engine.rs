//! Client traits and the shared parameter buffer.

use crate::error::EngineError;
use async_trait::async_trait;
use stability_core::{GeneratedValue, ParameterMetadata, SqlType};
use std::fmt;

/// Shape of a read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Ad-hoc script, one parameter row
    Request,
    /// Ad-hoc script, a batch of parameter rows
    BatchRequest,
    /// Registered procedure, one parameter row
    Procedure,
    /// Registered procedure, a batch of parameter rows
    BatchProcedure,
}

impl RequestKind {
    pub const ALL: [RequestKind; 4] = [
        RequestKind::Request,
        RequestKind::BatchRequest,
        RequestKind::Procedure,
        RequestKind::BatchProcedure,
    ];

    pub fn from_flags(batched: bool, procedure: bool) -> Self {
        match (batched, procedure) {
            (false, false) => RequestKind::Request,
            (true, false) => RequestKind::BatchRequest,
            (false, true) => RequestKind::Procedure,
            (true, true) => RequestKind::BatchProcedure,
        }
    }

    pub fn is_batched(&self) -> bool {
        matches!(self, RequestKind::BatchRequest | RequestKind::BatchProcedure)
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, RequestKind::Procedure | RequestKind::BatchProcedure)
    }

    pub fn name(&self) -> &'static str {
        match self {
            RequestKind::Request => "request",
            RequestKind::BatchRequest => "batch_request",
            RequestKind::Procedure => "procedure",
            RequestKind::BatchProcedure => "batch_procedure",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of an executed request. The workload discards it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Rows returned by the engine
    pub rows: usize,
}

/// Client of the query engine.
///
/// Implementations are shared by every worker and must be safe to call
/// concurrently.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Create a database.
    async fn create_database(&self, name: &str) -> Result<(), EngineError>;

    /// Drop a database.
    async fn drop_database(&self, name: &str) -> Result<(), EngineError>;

    /// Execute a DDL statement (`CREATE TABLE`, `CREATE PROCEDURE`, `DROP TABLE`).
    async fn execute_ddl(&self, database: &str, statement: &str) -> Result<(), EngineError>;

    /// Execute a textual `INSERT`.
    async fn execute_insert(&self, database: &str, statement: &str) -> Result<(), EngineError>;

    /// Prepare an ad-hoc request taking one parameter row.
    async fn prepare_request(
        &self,
        database: &str,
        script: &str,
    ) -> Result<Box<dyn RequestHandle>, EngineError>;

    /// Prepare an ad-hoc request taking a batch of parameter rows.
    ///
    /// `common_column_positions` name the columns whose value is shared by
    /// every row of the batch.
    async fn prepare_batch_request(
        &self,
        database: &str,
        script: &str,
        common_column_positions: &[usize],
    ) -> Result<Box<dyn RequestHandle>, EngineError>;

    /// Prepare a call of a registered procedure taking one parameter row.
    async fn prepare_procedure_call(
        &self,
        database: &str,
        procedure: &str,
    ) -> Result<Box<dyn RequestHandle>, EngineError>;

    /// Prepare a call of a registered procedure taking a batch of rows.
    async fn prepare_batch_procedure_call(
        &self,
        database: &str,
        procedure: &str,
    ) -> Result<Box<dyn RequestHandle>, EngineError>;
}

/// A prepared request, owned by one worker for one iteration.
///
/// Dropping the handle releases it, whether or not it was executed.
#[async_trait]
pub trait RequestHandle: Send {
    /// Declared input parameters.
    fn parameter_metadata(&self) -> &ParameterMetadata;

    /// Bind one value to the current parameter row.
    fn bind(&mut self, position: usize, value: GeneratedValue) -> Result<(), EngineError>;

    /// Move the current parameter row into the batch.
    fn add_to_batch(&mut self) -> Result<(), EngineError>;

    /// Execute with the bound parameters.
    async fn execute(&mut self) -> Result<QueryResult, EngineError>;
}

/// Parameter rows of a prepared request, buffered until execution.
///
/// Both bundled clients keep their parameters here. Binding checks the
/// position and the declared type; a batch accepts only complete rows.
#[derive(Debug, Clone)]
pub struct RowBuffer {
    metadata: ParameterMetadata,
    batched: bool,
    current: Vec<Option<GeneratedValue>>,
    batch: Vec<Vec<GeneratedValue>>,
}

impl RowBuffer {
    pub fn new(metadata: ParameterMetadata, batched: bool) -> Self {
        let current = vec![None; metadata.column_count()];
        Self {
            metadata,
            batched,
            current,
            batch: Vec::new(),
        }
    }

    pub fn metadata(&self) -> &ParameterMetadata {
        &self.metadata
    }

    pub fn is_batched(&self) -> bool {
        self.batched
    }

    /// Rows already moved into the batch.
    pub fn batch_len(&self) -> usize {
        self.batch.len()
    }

    pub fn bind(&mut self, position: usize, value: GeneratedValue) -> Result<(), EngineError> {
        let column = self
            .metadata
            .columns()
            .iter()
            .find(|c| c.position == position)
            .ok_or_else(|| EngineError::Bind {
                position,
                reason: format!(
                    "request declares {} parameters",
                    self.metadata.column_count()
                ),
            })?;

        if let Ok(declared) = column.type_name.parse::<SqlType>() {
            if declared != value.sql_type() {
                return Err(EngineError::Bind {
                    position,
                    reason: format!("expected {declared}, got {}", value.sql_type()),
                });
            }
        }

        let slot = self
            .current
            .get_mut(position)
            .ok_or_else(|| EngineError::Bind {
                position,
                reason: "position outside parameter row".to_string(),
            })?;
        *slot = Some(value);
        Ok(())
    }

    pub fn add_to_batch(&mut self) -> Result<(), EngineError> {
        let row = self.complete_row()?;
        self.batch.push(row);
        Ok(())
    }

    /// Parameter rows to send: the batch for batched requests, otherwise the
    /// single current row.
    pub fn take_rows(&mut self) -> Result<Vec<Vec<GeneratedValue>>, EngineError> {
        if self.batched {
            Ok(std::mem::take(&mut self.batch))
        } else {
            Ok(vec![self.complete_row()?])
        }
    }

    fn complete_row(&mut self) -> Result<Vec<GeneratedValue>, EngineError> {
        if let Some(position) = self.current.iter().position(Option::is_none) {
            return Err(EngineError::Unbound(position));
        }
        let width = self.current.len();
        Ok(std::mem::replace(&mut self.current, vec![None; width])
            .into_iter()
            .flatten()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ParameterMetadata {
        ParameterMetadata::from_type_names(["string", "int"])
    }

    #[test]
    fn test_request_kind_flags() {
        assert_eq!(RequestKind::from_flags(false, false), RequestKind::Request);
        assert_eq!(RequestKind::from_flags(true, true), RequestKind::BatchProcedure);
        for kind in RequestKind::ALL {
            assert_eq!(
                RequestKind::from_flags(kind.is_batched(), kind.is_procedure()),
                kind
            );
        }
        assert_eq!(RequestKind::BatchRequest.to_string(), "batch_request");
    }

    #[test]
    fn test_single_row() {
        let mut buffer = RowBuffer::new(metadata(), false);
        buffer.bind(0, GeneratedValue::String("a".into())).unwrap();
        buffer.bind(1, GeneratedValue::Int(1)).unwrap();

        let rows = buffer.take_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], GeneratedValue::Int(1));
    }

    #[test]
    fn test_single_row_unbound() {
        let mut buffer = RowBuffer::new(metadata(), false);
        buffer.bind(0, GeneratedValue::String("a".into())).unwrap();
        assert!(matches!(buffer.take_rows(), Err(EngineError::Unbound(1))));
    }

    #[test]
    fn test_bind_type_mismatch() {
        let mut buffer = RowBuffer::new(metadata(), false);
        let err = buffer.bind(1, GeneratedValue::BigInt(1)).unwrap_err();
        assert!(matches!(err, EngineError::Bind { position: 1, .. }));
    }

    #[test]
    fn test_bind_out_of_range() {
        let mut buffer = RowBuffer::new(metadata(), false);
        assert!(buffer.bind(5, GeneratedValue::Int(1)).is_err());
    }

    #[test]
    fn test_batch() {
        let mut buffer = RowBuffer::new(metadata(), true);
        for i in 0..3 {
            buffer.bind(0, GeneratedValue::String(format!("r{i}"))).unwrap();
            buffer.bind(1, GeneratedValue::Int(i)).unwrap();
            buffer.add_to_batch().unwrap();
        }
        assert_eq!(buffer.batch_len(), 3);

        // incomplete row is rejected and does not reach the batch
        buffer.bind(0, GeneratedValue::String("partial".into())).unwrap();
        assert!(buffer.add_to_batch().is_err());

        let rows = buffer.take_rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][0], GeneratedValue::String("r2".into()));
    }

    #[test]
    fn test_empty_batch_is_executable() {
        let mut buffer = RowBuffer::new(metadata(), true);
        assert!(buffer.take_rows().unwrap().is_empty());
    }
}
