//! Pipeline application.
//!
//! [`apply`] is a pure function of its inputs: it clones what it changes,
//! keeps no state between calls and gives the same output for the same
//! dataset and transform list.

use super::error::TransformError;
use super::{column_ops, grouping, window};
use super::{Transform, TransformId, TransformKind};
use crate::constants::SLOW_OPERATION_MS;
use crate::data::TabularDataset;
use crate::perf::ScopedTimer;
use crate::profile_scope;
use tracing::{debug, warn};

/// A transform that failed and was skipped
#[derive(Clone, Debug, PartialEq)]
pub struct TransformWarning {
    pub transform_id: TransformId,
    /// Label of the transform kind
    pub kind: &'static str,
    pub message: String,
    pub error: TransformError,
}

/// Result of running a pipeline
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOutput {
    pub dataset: TabularDataset,
    pub warnings: Vec<TransformWarning>,
    /// Number of enabled transforms that succeeded
    pub applied: usize,
    pub skipped_disabled: usize,
}

impl PipelineOutput {
    /// Output of an empty pipeline
    pub fn unchanged(dataset: TabularDataset) -> Self {
        Self {
            dataset,
            warnings: Vec::new(),
            applied: 0,
            skipped_disabled: 0,
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn warning_for(&self, id: TransformId) -> Option<&TransformWarning> {
        self.warnings.iter().find(|w| w.transform_id == id)
    }
}

/// Run `transforms` over `dataset` in order.
///
/// Disabled transforms are skipped in place. A transform that fails is
/// recorded as a warning and the next transform receives the dataset from
/// before the failing step.
pub fn apply(dataset: &TabularDataset, transforms: &[Transform]) -> PipelineOutput {
    let _timer = ScopedTimer::new("transform::apply", SLOW_OPERATION_MS);
    let mut output = PipelineOutput::unchanged(dataset.clone());

    for transform in transforms {
        if !transform.enabled {
            output.skipped_disabled += 1;
            continue;
        }
        let step = {
            profile_scope!(transform.kind.label(), SLOW_OPERATION_MS);
            apply_one(&output.dataset, &transform.kind)
        };
        match step {
            Ok(next) => {
                output.dataset = next;
                output.applied += 1;
            }
            Err(error) => {
                let kind = transform.kind.label();
                warn!(
                    transform = %transform.id,
                    kind,
                    "Transform skipped: {}",
                    error
                );
                output.warnings.push(TransformWarning {
                    transform_id: transform.id,
                    kind,
                    message: format!("{kind}: {error}"),
                    error,
                });
            }
        }
    }

    debug!(
        transforms = transforms.len(),
        applied = output.applied,
        disabled = output.skipped_disabled,
        warnings = output.warnings.len(),
        rows = output.dataset.row_count(),
        columns = output.dataset.column_count(),
        "Pipeline applied"
    );
    output
}

/// Apply a single transform
pub fn apply_one(
    dataset: &TabularDataset,
    kind: &TransformKind,
) -> Result<TabularDataset, TransformError> {
    match kind {
        TransformKind::ColumnMath {
            op,
            left,
            right,
            result_name,
        } => column_ops::column_math(dataset, *op, left, right, result_name),
        TransformKind::Normalize { method, column } => {
            column_ops::normalize(dataset, *method, column)
        }
        TransformKind::Smooth {
            method,
            column,
            window: size,
            alpha,
            partial_window,
        } => window::smooth(dataset, *method, column, *size, *alpha, *partial_window),
        TransformKind::Resample {
            date_column,
            rule,
            aggregation,
        } => grouping::resample(dataset, date_column, *rule, *aggregation),
        TransformKind::Interpolate { method, columns } => {
            column_ops::interpolate(dataset, *method, columns)
        }
        TransformKind::Diff { column, periods } => column_ops::diff(dataset, column, *periods),
        TransformKind::PctChange { column, periods } => {
            column_ops::pct_change(dataset, column, *periods)
        }
        TransformKind::Filter { expression } => column_ops::filter(dataset, expression),
        TransformKind::Group { by, aggregation } => grouping::group(dataset, by, *aggregation),
        TransformKind::ComputedColumn {
            result_name,
            expression,
        } => column_ops::computed_column(dataset, result_name, expression),
    }
}
