//! HTTP client for an engine API server.
//!
//! Endpoints used:
//!
//! - `POST /dbs/{db}` with `{"mode": "online", "sql": ...}` - DDL and inserts
//! - `POST /dbs/{db}` with `{"mode": "request", "sql": ..., "input": {...}}` - ad-hoc requests
//! - `GET /dbs/{db}/deployments/{name}` - declared inputs of a procedure
//! - `POST /dbs/{db}/deployments/{name}` with `{"input": rows}` - procedure calls
//!
//! Every response carries `{"code": 0, "msg": "ok", "data": ...}`; a non-zero
//! code is returned as [`EngineError::Rejected`].

use crate::engine::{QueryEngine, QueryResult, RequestHandle, RequestKind, RowBuffer};
use crate::error::EngineError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use stability_core::{GeneratedValue, ParameterColumn, ParameterMetadata};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct DeploymentInfo {
    #[serde(default)]
    input_schema: Vec<SchemaColumn>,
}

#[derive(Debug, Deserialize)]
struct SchemaColumn {
    #[serde(rename = "type")]
    column_type: String,
}

/// Client of an engine API server.
///
/// Ad-hoc requests declare `request_schema` as their input row (the main
/// table); procedure calls ask the server for the procedure's inputs.
#[derive(Debug, Clone)]
pub struct ApiServerEngine {
    client: reqwest::Client,
    endpoint: String,
    request_schema: ParameterMetadata,
}

impl ApiServerEngine {
    /// Create a client for the API server at `endpoint` (e.g. `http://127.0.0.1:9080`).
    pub fn new(endpoint: impl Into<String>, request_schema: ParameterMetadata) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            request_schema,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn database_url(&self, database: &str) -> String {
        format!("{}/dbs/{}", self.endpoint, database)
    }

    fn deployment_url(&self, database: &str, procedure: &str) -> String {
        format!("{}/dbs/{}/deployments/{}", self.endpoint, database, procedure)
    }

    async fn execute_sql(&self, database: &str, sql: &str) -> Result<Value, EngineError> {
        debug!("{}: {}", database, sql);
        let body = json!({ "mode": "online", "sql": sql });
        let response = self
            .client
            .post(self.database_url(database))
            .json(&body)
            .send()
            .await?;
        into_data(response).await
    }

    async fn procedure_inputs(
        &self,
        database: &str,
        procedure: &str,
    ) -> Result<ParameterMetadata, EngineError> {
        let response = self
            .client
            .get(self.deployment_url(database, procedure))
            .send()
            .await?;
        let data = into_data(response).await?;
        let info: DeploymentInfo = serde_json::from_value(data)
            .map_err(|e| EngineError::Protocol(format!("invalid deployment description: {e}")))?;
        Ok(ParameterMetadata::new(
            info.input_schema
                .into_iter()
                .enumerate()
                .map(|(position, column)| ParameterColumn {
                    position,
                    type_name: column.column_type,
                })
                .collect(),
        ))
    }

    fn request(
        &self,
        kind: RequestKind,
        url: String,
        target: Target,
        metadata: ParameterMetadata,
    ) -> Box<dyn RequestHandle> {
        Box::new(ApiServerRequest {
            client: self.client.clone(),
            kind,
            url,
            target,
            buffer: RowBuffer::new(metadata, kind.is_batched()),
        })
    }
}

async fn into_data(response: reqwest::Response) -> Result<Value, EngineError> {
    let status = response.status();
    if !status.is_success() {
        return Err(EngineError::Protocol(format!("HTTP status {status}")));
    }
    let body: ApiResponse = response.json().await?;
    check_response(body)
}

fn check_response(body: ApiResponse) -> Result<Value, EngineError> {
    if body.code != 0 {
        return Err(EngineError::Rejected {
            code: body.code,
            message: body.msg,
        });
    }
    Ok(body.data)
}

/// JSON representation of a bound value.
pub fn json_value(value: &GeneratedValue) -> Value {
    match value {
        GeneratedValue::String(s) => Value::from(s.as_str()),
        GeneratedValue::Float(f) => Value::from(f64::from(*f)),
        GeneratedValue::Double(d) => Value::from(*d),
        GeneratedValue::Int(i) => Value::from(*i),
        GeneratedValue::BigInt(i) => Value::from(*i),
        GeneratedValue::Bool(b) => Value::from(*b),
        GeneratedValue::Date(d) => Value::from(d.format("%Y-%m-%d").to_string()),
        GeneratedValue::Timestamp(ts) => Value::from(ts.timestamp_millis()),
    }
}

fn json_rows(rows: &[Vec<GeneratedValue>]) -> Value {
    Value::Array(
        rows.iter()
            .map(|row| Value::Array(row.iter().map(json_value).collect()))
            .collect(),
    )
}

fn returned_rows(data: &Value) -> usize {
    data.get("data")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0)
}

#[async_trait]
impl QueryEngine for ApiServerEngine {
    async fn create_database(&self, name: &str) -> Result<(), EngineError> {
        self.execute_sql(name, &format!("CREATE DATABASE {name};"))
            .await
            .map(drop)
    }

    async fn drop_database(&self, name: &str) -> Result<(), EngineError> {
        self.execute_sql(name, &format!("DROP DATABASE {name};"))
            .await
            .map(drop)
    }

    async fn execute_ddl(&self, database: &str, statement: &str) -> Result<(), EngineError> {
        self.execute_sql(database, statement).await.map(drop)
    }

    async fn execute_insert(&self, database: &str, statement: &str) -> Result<(), EngineError> {
        self.execute_sql(database, statement).await.map(drop)
    }

    async fn prepare_request(
        &self,
        database: &str,
        script: &str,
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        Ok(self.request(
            RequestKind::Request,
            self.database_url(database),
            Target::Script {
                sql: script.to_string(),
                common_column_positions: Vec::new(),
            },
            self.request_schema.clone(),
        ))
    }

    async fn prepare_batch_request(
        &self,
        database: &str,
        script: &str,
        common_column_positions: &[usize],
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        Ok(self.request(
            RequestKind::BatchRequest,
            self.database_url(database),
            Target::Script {
                sql: script.to_string(),
                common_column_positions: common_column_positions.to_vec(),
            },
            self.request_schema.clone(),
        ))
    }

    async fn prepare_procedure_call(
        &self,
        database: &str,
        procedure: &str,
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        let metadata = self.procedure_inputs(database, procedure).await?;
        Ok(self.request(
            RequestKind::Procedure,
            self.deployment_url(database, procedure),
            Target::Procedure,
            metadata,
        ))
    }

    async fn prepare_batch_procedure_call(
        &self,
        database: &str,
        procedure: &str,
    ) -> Result<Box<dyn RequestHandle>, EngineError> {
        let metadata = self.procedure_inputs(database, procedure).await?;
        Ok(self.request(
            RequestKind::BatchProcedure,
            self.deployment_url(database, procedure),
            Target::Procedure,
            metadata,
        ))
    }
}

enum Target {
    Script {
        sql: String,
        common_column_positions: Vec<usize>,
    },
    Procedure,
}

struct ApiServerRequest {
    client: reqwest::Client,
    kind: RequestKind,
    url: String,
    target: Target,
    buffer: RowBuffer,
}

impl ApiServerRequest {
    fn body(&self, rows: &[Vec<GeneratedValue>]) -> Value {
        match &self.target {
            Target::Script {
                sql,
                common_column_positions,
            } => {
                let schema: Vec<&str> = self
                    .buffer
                    .metadata()
                    .columns()
                    .iter()
                    .map(|c| c.type_name.as_str())
                    .collect();
                json!({
                    "mode": "request",
                    "sql": sql,
                    "input": {
                        "schema": schema,
                        "data": json_rows(rows),
                        "common_cols": common_column_positions,
                    },
                })
            }
            Target::Procedure => json!({ "input": json_rows(rows) }),
        }
    }
}

#[async_trait]
impl RequestHandle for ApiServerRequest {
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
        let body = self.body(&rows);
        debug!("execute {} with {} rows", self.kind, rows.len());
        let response = self.client.post(&self.url).json(&body).send().await?;
        let data = into_data(response).await?;
        Ok(QueryResult {
            rows: returned_rows(&data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate};

    #[test]
    fn test_json_values() {
        assert_eq!(json_value(&GeneratedValue::String("a".into())), json!("a"));
        assert_eq!(json_value(&GeneratedValue::Int(7)), json!(7));
        assert_eq!(json_value(&GeneratedValue::BigInt(7)), json!(7));
        assert_eq!(json_value(&GeneratedValue::Double(1.4)), json!(1.4));
        assert_eq!(json_value(&GeneratedValue::Bool(true)), json!(true));

        let date = NaiveDate::from_ymd_opt(2020, 11, 27).unwrap();
        assert_eq!(json_value(&GeneratedValue::Date(date)), json!("2020-11-27"));

        let ts = DateTime::from_timestamp_millis(1_606_435_200_000).unwrap();
        assert_eq!(
            json_value(&GeneratedValue::Timestamp(ts)),
            json!(1_606_435_200_000i64)
        );
    }

    #[test]
    fn test_check_response() {
        let ok: ApiResponse =
            serde_json::from_value(json!({"code": 0, "msg": "ok", "data": {"data": [[1], [2]]}}))
                .unwrap();
        let data = check_response(ok).unwrap();
        assert_eq!(returned_rows(&data), 2);

        let rejected: ApiResponse =
            serde_json::from_value(json!({"code": -1, "msg": "table not found"})).unwrap();
        assert!(matches!(
            check_response(rejected),
            Err(EngineError::Rejected { code: -1, ref message }) if message == "table not found"
        ));
    }

    #[test]
    fn test_deployment_info() {
        let info: DeploymentInfo = serde_json::from_value(json!({
            "name": "pname1",
            "input_schema": [
                {"name": "c1", "type": "string"},
                {"name": "c2", "type": "int64"}
            ]
        }))
        .unwrap();
        assert_eq!(info.input_schema.len(), 2);
        assert_eq!(info.input_schema[1].column_type, "int64");
    }

    #[test]
    fn test_batch_request_body() {
        let engine = ApiServerEngine::new(
            "http://127.0.0.1:9080/",
            ParameterMetadata::from_type_names(["string", "bigint"]),
        );
        assert_eq!(engine.endpoint(), "http://127.0.0.1:9080");

        let mut handle = ApiServerRequest {
            client: reqwest::Client::new(),
            kind: RequestKind::BatchRequest,
            url: engine.database_url("perf1"),
            target: Target::Script {
                sql: "select * from t".into(),
                common_column_positions: vec![0],
            },
            buffer: RowBuffer::new(engine.request_schema.clone(), true),
        };
        handle.bind(0, GeneratedValue::String("col0-1".into())).unwrap();
        handle.bind(1, GeneratedValue::BigInt(1)).unwrap();
        handle.add_to_batch().unwrap();

        let rows = handle.buffer.take_rows().unwrap();
        let body = handle.body(&rows);
        assert_eq!(body["mode"], "request");
        assert_eq!(body["input"]["schema"], json!(["string", "bigint"]));
        assert_eq!(body["input"]["data"], json!([["col0-1", 1]]));
        assert_eq!(body["input"]["common_cols"], json!([0]));
        assert_eq!(handle.url, "http://127.0.0.1:9080/dbs/perf1");
    }
}
