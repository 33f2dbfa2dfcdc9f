//! Error types for query-engine clients.

use thiserror::Error;

/// Errors returned by a query-engine client or a prepared request.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine answered with a non-zero status code.
    #[error("Engine rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },

    /// The engine answered with something that is not a valid response.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Database does not exist.
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    /// Database already exists.
    #[error("Database already exists: {0}")]
    DatabaseExists(String),

    /// Binding a value into a prepared request failed.
    #[error("Bind error at position {position}: {reason}")]
    Bind { position: usize, reason: String },

    /// A prepared request was executed with parameters left unbound.
    #[error("Parameter at position {0} is not bound")]
    Unbound(usize),
}
