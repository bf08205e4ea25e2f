//! Errors reported by [`super::AppState`] mutations

use crate::data::DataError;
use crate::transform::TransformId;
use crate::types::AnnotationId;
use thiserror::Error;

/// Why a mutation, undo or redo did not happen.
///
/// A mutation that returns one of these left the project and its history
/// untouched.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    /// Column missing from the post-transform dataset
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid {axis}: {reason}")]
    InvalidAxis { axis: &'static str, reason: String },

    #[error("Invalid series {column:?}: {reason}")]
    InvalidSeries { column: String, reason: String },

    #[error("No series plots column {0:?}")]
    SeriesNotFound(String),

    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("Invalid theme: {0}")]
    InvalidTheme(String),

    #[error("Invalid figure size: {0}")]
    InvalidFigure(String),

    #[error("Annotation not found: {0}")]
    AnnotationNotFound(AnnotationId),

    #[error("Transform not found: {0}")]
    TransformNotFound(TransformId),

    #[error("Transform position {index} is out of range for {len} transforms")]
    TransformOutOfRange { index: usize, len: usize },

    /// Dataset edit rejected, including duplicate or empty column names
    #[error(transparent)]
    Data(#[from] DataError),
}

impl StateError {
    /// Whether this is a rejected column name
    pub fn is_invalid_name(&self) -> bool {
        matches!(self, StateError::Data(DataError::InvalidName { .. }))
    }
}

pub type StateResult<T> = Result<T, StateError>;
