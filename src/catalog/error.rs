use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the catalog session, its drivers and the bulk loader.
///
/// Connection and schema errors are fatal and propagate to the caller.
/// Record-level errors (`Parse`, `MissingField`, `InvalidTimestamp`, `BindMismatch`
/// and driver failures on a single write) are logged by the loader and the
/// record is skipped.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read connection bundle {path}: {source}")]
    BundleIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid connection bundle {path}: {source}")]
    BundleFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("session is not connected")]
    NotConnected,
    #[error("prepared statements are not initialized")]
    NotInitialized,
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("table does not exist: {0}")]
    UnknownTable(String),
    #[error("{operation} failed on '{table}': {message}")]
    Driver {
        operation: &'static str,
        table: String,
        message: String,
    },
    #[error("cannot bind {given} values to {statement}")]
    BindMismatch {
        statement: &'static str,
        given: &'static str,
    },
    #[error("expected {expected} row from the store")]
    UnexpectedRow { expected: &'static str },
    #[error("malformed record: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{record} record is missing required field '{field}'")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },
    #[error("review time out of range: {0}")]
    InvalidTimestamp(i64),
    #[error("row codec error: {0}")]
    Codec(#[from] serde_dynamo::Error),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid setting {name}: {message}")]
    Config { name: &'static str, message: String },
}

impl CatalogError {
    /// Wraps a store-side failure with the operation and table it hit.
    pub fn driver(
        operation: &'static str,
        table: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Driver {
            operation,
            table: table.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
