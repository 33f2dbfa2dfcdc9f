//! Names of the database and procedure owned by one run.

use chrono::Utc;

/// Default prefix of the per-run database name.
pub const DEFAULT_DATABASE_PREFIX: &str = "perf";

/// Default prefix of the per-run procedure name.
pub const DEFAULT_PROCEDURE_PREFIX: &str = "pname";

/// Database and procedure names of one run.
///
/// Both names are derived from a single construction timestamp, so every
/// component that receives this value agrees on them. Construct it once at
/// startup and pass it around; nothing recomputes the names later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentity {
    database: String,
    procedure: String,
    created_at_ms: i64,
}

impl RunIdentity {
    /// Derive both names from the current wall-clock time.
    pub fn new(database_prefix: &str, procedure_prefix: &str) -> Self {
        Self::at(database_prefix, procedure_prefix, Utc::now().timestamp_millis())
    }

    /// Derive both names from an explicit epoch-millisecond timestamp.
    pub fn at(database_prefix: &str, procedure_prefix: &str, created_at_ms: i64) -> Self {
        Self {
            database: format!("{database_prefix}{created_at_ms}"),
            procedure: format!("{procedure_prefix}{created_at_ms}"),
            created_at_ms,
        }
    }

    /// Use an existing database instead of the derived name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Use an existing procedure instead of the derived name.
    pub fn with_procedure(mut self, procedure: impl Into<String>) -> Self {
        self.procedure = procedure.into();
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn procedure(&self) -> &str {
        &self.procedure
    }

    pub fn created_at_ms(&self) -> i64 {
        self.created_at_ms
    }
}

impl Default for RunIdentity {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_PREFIX, DEFAULT_PROCEDURE_PREFIX)
    }
}
