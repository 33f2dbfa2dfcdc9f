//! Database, table and procedure provisioning.
//!
//! Provisioning runs once before the worker pools start. Every step is
//! sequential and nothing is rolled back: a failure leaves whatever was
//! already created in place and aborts the run.

use crate::error::ProvisionError;
use stability_core::{RunIdentity, SchemaRegistry, TableDescriptor};
use stability_engine::QueryEngine;
use tracing::{info, warn};

/// Outcome of a best-effort teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Tables dropped successfully
    pub dropped_tables: Vec<String>,
    /// Tables whose drop failed, with the engine's message
    pub failed_tables: Vec<(String, String)>,
}

/// `CREATE PROCEDURE <proc>(<col> <type>, ...) BEGIN <script> END;`
///
/// The parameter list mirrors the main table's columns in order.
pub fn create_procedure_statement(
    procedure: &str,
    main_table: &TableDescriptor,
    script: &str,
) -> String {
    let params = main_table
        .columns()
        .iter()
        .map(|c| format!("{} {}", c.name, c.column_type.ddl_name()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE PROCEDURE {procedure}({params}) BEGIN {script} END;")
}

/// Create the run's database, every table in registry order, then the
/// procedure over the main table.
pub async fn provision(
    engine: &dyn QueryEngine,
    registry: &SchemaRegistry,
    identity: &RunIdentity,
    script: &str,
) -> Result<(), ProvisionError> {
    let database = identity.database();

    engine
        .create_database(database)
        .await
        .map_err(|source| ProvisionError::CreateDatabase {
            database: database.to_string(),
            source,
        })?;
    info!("Created database {}", database);

    for table in registry.tables() {
        engine
            .execute_ddl(database, table.ddl())
            .await
            .map_err(|source| ProvisionError::CreateTable {
                table: table.name().to_string(),
                source,
            })?;
        info!("Created table {}.{}", database, table.name());
    }

    let procedure = identity.procedure();
    let statement = create_procedure_statement(procedure, registry.main_table(), script);
    engine
        .execute_ddl(database, &statement)
        .await
        .map_err(|source| ProvisionError::CreateProcedure {
            procedure: procedure.to_string(),
            source,
        })?;
    info!("Created procedure {}.{}", database, procedure);

    Ok(())
}

/// Drop every table of `registry`, then `database`.
///
/// Table drops are best effort; only failing to drop the database itself is
/// an error.
pub async fn teardown(
    engine: &dyn QueryEngine,
    registry: &SchemaRegistry,
    database: &str,
) -> Result<TeardownReport, ProvisionError> {
    let mut report = TeardownReport::default();

    for table in registry.tables() {
        let statement = format!("DROP TABLE {};", table.name());
        match engine.execute_ddl(database, &statement).await {
            Ok(()) => report.dropped_tables.push(table.name().to_string()),
            Err(e) => {
                warn!("Failed to drop table {}.{}: {}", database, table.name(), e);
                report
                    .failed_tables
                    .push((table.name().to_string(), e.to_string()));
            }
        }
    }

    engine
        .drop_database(database)
        .await
        .map_err(|source| ProvisionError::DropDatabase {
            database: database.to_string(),
            source,
        })?;
    info!(
        "Dropped database {} ({} tables dropped, {} failed)",
        database,
        report.dropped_tables.len(),
        report.failed_tables.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stability_core::ParameterMetadata;
    use stability_engine::DryRunEngine;

    const RELATION: &str = "main_table: t1\n";
    const DDL: &str = "create table t1 (c1 string, c2 int, c3 timestamp, index(key=c1, ts=c3));\n\
                       create table t2 (c1 string, v double);";

    fn setup() -> (SchemaRegistry, DryRunEngine) {
        let registry = SchemaRegistry::from_sources(RELATION, DDL).unwrap();
        let engine = DryRunEngine::new(ParameterMetadata::from_table(registry.main_table()));
        (registry, engine)
    }

    #[test]
    fn test_create_procedure_statement() {
        let (registry, _) = setup();
        let statement = create_procedure_statement(
            "pname1",
            registry.main_table(),
            "select c1, sum(c2) over w from t1 window w as (partition by c1 order by c3 rows between 10 preceding and current row);",
        );
        assert_eq!(
            statement,
            "CREATE PROCEDURE pname1(c1 string, c2 int, c3 timestamp) BEGIN select c1, sum(c2) over w from t1 window w as (partition by c1 order by c3 rows between 10 preceding and current row); END;"
        );
    }

    #[tokio::test]
    async fn test_provision_order() {
        let (registry, engine) = setup();
        let identity = RunIdentity::at("perf", "pname", 1);

        provision(&engine, &registry, &identity, "select * from t1;")
            .await
            .unwrap();

        assert!(engine.has_database("perf1"));
        let log = engine.ddl_log();
        assert_eq!(log.len(), 3);
        assert!(log[0].starts_with("create table t1"));
        assert!(log[1].starts_with("create table t2"));
        assert!(log[2].starts_with("CREATE PROCEDURE pname1("));
    }

    #[tokio::test]
    async fn test_provision_existing_database_aborts() {
        let (registry, engine) = setup();
        let engine = engine.with_database("perf1");
        let identity = RunIdentity::at("perf", "pname", 1);

        let err = provision(&engine, &registry, &identity, "select 1;")
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::CreateDatabase { .. }));
        assert!(engine.ddl_log().is_empty());
    }

    #[tokio::test]
    async fn test_teardown() {
        let (registry, engine) = setup();
        let engine = engine.with_database("perf1");

        let report = teardown(&engine, &registry, "perf1").await.unwrap();
        assert_eq!(report.dropped_tables, vec!["t1", "t2"]);
        assert!(report.failed_tables.is_empty());
        assert!(!engine.has_database("perf1"));
        assert_eq!(engine.ddl_log(), vec!["DROP TABLE t1;", "DROP TABLE t2;"]);
    }

    #[tokio::test]
    async fn test_teardown_missing_database() {
        let (registry, engine) = setup();

        let err = teardown(&engine, &registry, "perf1").await.unwrap_err();
        assert!(matches!(err, ProvisionError::DropDatabase { .. }));
    }
}
