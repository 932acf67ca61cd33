use thiserror::Error;

use crate::utils::types::ColumnType;

/// Main error type for the Mirage engine.
///
/// Every variant is cloneable so that concurrent callers coalesced onto one
/// in-flight generation can all observe the same failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MirageError {
    #[error("Schema resolution error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Data materialization error: {0}")]
    Data(#[from] DataError),

    #[error("Cursor error: {0}")]
    Cursor(#[from] CursorError),

    #[error("Cache I/O error: {0}")]
    CacheIo(#[from] CacheIoError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures while resolving a table's schema
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("generator returned no columns for table '{0}'")]
    EmptySchema(String),

    #[error("invalid or duplicate column name '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("invalid column type '{found}' for column '{column}' in table '{table}'")]
    InvalidType {
        table: String,
        column: String,
        found: String,
    },

    #[error("schema generation failed: {0}")]
    Generator(#[from] GeneratorError),
}

/// Failures while materializing a table's rows
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("generator returned no rows for table '{0}'")]
    EmptyData(String),

    #[error("malformed data response for table '{table}': {detail}")]
    MalformedResponse { table: String, detail: String },

    #[error("data generation failed: {0}")]
    Generator(#[from] GeneratorError),
}

/// Failures while reading through a cursor
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CursorError {
    #[error("cursor out of range: position {position}, column index {index}")]
    OutOfRange { position: usize, index: usize },

    #[error("type mismatch for column '{column}': expected {expected}")]
    TypeMismatch { column: String, expected: ColumnType },
}

/// Failures at the generative service boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeneratorError {
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("generation request failed: {0}")]
    RequestFailed(String),

    #[error("generator responded with status {status}: {detail}")]
    BadStatus { status: u16, detail: String },

    #[error("malformed generator payload: {0}")]
    MalformedPayload(String),
}

/// Cache maintenance failures; non-fatal on the materialization write path
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheIoError {
    #[error("failed to write cache file {path}: {detail}")]
    WriteFailed { path: String, detail: String },

    #[error("failed to remove cache file {path}: {detail}")]
    RemoveFailed { path: String, detail: String },

    #[error("failed to scan cache directory {path}: {detail}")]
    ScanFailed { path: String, detail: String },
}

/// Result type alias for Mirage operations
pub type MirageResult<T> = Result<T, MirageError>;
