//! Error types for transform application

use crate::data::{ColumnType, DataError};
use crate::transform::expr::ExpressionError;
use thiserror::Error;

/// Why a single transform could not be applied
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// Column referenced by a parameter does not exist at this pipeline step
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Operation requires numeric or datetime input
    #[error("Column {column:?} is {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: ColumnType,
    },

    /// Parameter outside its accepted range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Malformed or disallowed Filter/ComputedColumn expression
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// Dataset invariant violated by the produced table
    #[error("Data error: {0}")]
    Data(String),
}

impl TransformError {
    pub(crate) fn type_mismatch(column: &str, expected: &'static str, found: ColumnType) -> Self {
        TransformError::TypeMismatch {
            column: column.to_string(),
            expected,
            found,
        }
    }
}

impl From<DataError> for TransformError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::ColumnNotFound(name) => TransformError::ColumnNotFound(name),
            DataError::TypeMismatch {
                column,
                expected,
                found,
            } => TransformError::TypeMismatch {
                column,
                expected,
                found,
            },
            other => TransformError::Data(other.to_string()),
        }
    }
}
