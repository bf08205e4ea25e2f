//! Error types for data operations
//!
//! Provides unified error handling for dataset edits and for all data
//! loading and parsing operations.

use crate::data::ColumnType;
use thiserror::Error;

// Import limits, re-exported for callers of the parsers
pub use crate::constants::{MAX_CSV_ROWS, MAX_CSV_SIZE_MB};

/// Errors that can occur during data operations
#[derive(Error, Debug)]
pub enum DataError {
    /// IO error from std::io
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parse error: {0}")]
    Csv(String),

    /// JSON parsing error from serde_json
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// File is too large for eager loading
    #[error("File too large: {size_mb}MB (max {max_mb}MB)")]
    TooLarge { size_mb: u64, max_mb: usize },

    /// Too many rows for eager loading
    #[error("Too many rows: {rows} (max {max_rows})")]
    TooManyRows { rows: usize, max_rows: usize },

    /// File is empty
    #[error("Empty file")]
    EmptyFile,

    /// No columns found in data
    #[error("No columns found")]
    NoColumns,

    /// Duplicate or empty column name on add/rename
    #[error("Invalid column name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Row or column position outside the dataset
    #[error("Index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    /// Column referenced by name does not exist
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Operation requires a different column type
    #[error("Column {column:?} is {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: ColumnType,
    },

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for data operations
pub type DataResult<T> = Result<T, DataError>;

impl DataError {
    pub(crate) fn duplicate_name(name: &str) -> Self {
        DataError::InvalidName {
            name: name.to_string(),
            reason: "a column with this name already exists",
        }
    }

    pub(crate) fn backtick_name(name: &str) -> Self {
        DataError::InvalidName {
            name: name.to_string(),
            reason: "column names cannot contain backticks",
        }
    }

    pub(crate) fn empty_name() -> Self {
        DataError::InvalidName {
            name: String::new(),
            reason: "column names cannot be empty",
        }
    }
}
