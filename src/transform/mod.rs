//! Ordered, toggleable transform pipeline.
//!
//! A [`Transform`] is one parameterised step. [`apply`] runs a list of them
//! over a dataset in order and never aborts: a failing step is skipped with
//! a [`TransformWarning`] and the next step sees the dataset as it was
//! before the failure.

mod column_ops;
mod engine;
mod error;
pub mod expr;
mod grouping;
pub(crate) mod stats;
mod window;

pub use engine::{apply, apply_one, PipelineOutput, TransformWarning};
pub use error::TransformError;
pub use expr::{ExpressionError, Scalar};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a transform across edits, undo and save/load
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformId(Uuid);

impl TransformId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransformId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One step of the pipeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub id: TransformId,
    pub enabled: bool,
    pub kind: TransformKind,
}

impl Transform {
    pub fn new(kind: TransformKind) -> Self {
        Self {
            id: TransformId::new(),
            enabled: true,
            kind,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

// ============================================================================
// Parameters
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl MathOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            MathOp::Add => "+",
            MathOp::Sub => "-",
            MathOp::Mul => "*",
            MathOp::Div => "/",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMethod {
    MinMax,
    ZScore,
    Robust,
}

impl NormalizeMethod {
    pub fn label(&self) -> &'static str {
        match self {
            NormalizeMethod::MinMax => "Min-Max (0-1)",
            NormalizeMethod::ZScore => "Z-Score",
            NormalizeMethod::Robust => "Robust (median/IQR)",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothMethod {
    RollingMean,
    RollingMedian,
    RollingSum,
    RollingStd,
    RollingMin,
    RollingMax,
    Ewm,
}

impl SmoothMethod {
    pub fn label(&self) -> &'static str {
        match self {
            SmoothMethod::RollingMean => "Rolling Mean",
            SmoothMethod::RollingMedian => "Rolling Median",
            SmoothMethod::RollingSum => "Rolling Sum",
            SmoothMethod::RollingStd => "Rolling Std",
            SmoothMethod::RollingMin => "Rolling Min",
            SmoothMethod::RollingMax => "Rolling Max",
            SmoothMethod::Ewm => "Exponential Weighted Mean",
        }
    }

    pub fn all() -> &'static [SmoothMethod] {
        &[
            SmoothMethod::RollingMean,
            SmoothMethod::RollingMedian,
            SmoothMethod::RollingSum,
            SmoothMethod::RollingStd,
            SmoothMethod::RollingMin,
            SmoothMethod::RollingMax,
            SmoothMethod::Ewm,
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleRule {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl ResampleRule {
    pub fn label(&self) -> &'static str {
        match self {
            ResampleRule::Daily => "Daily",
            ResampleRule::Weekly => "Weekly",
            ResampleRule::Monthly => "Monthly",
            ResampleRule::Yearly => "Yearly",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolateMethod {
    Linear,
    ForwardFill,
    BackwardFill,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    #[default]
    Mean,
    Median,
    Count,
    Min,
    Max,
    First,
    Last,
}

impl Aggregation {
    pub fn label(&self) -> &'static str {
        match self {
            Aggregation::Sum => "Sum",
            Aggregation::Mean => "Mean",
            Aggregation::Median => "Median",
            Aggregation::Count => "Count",
            Aggregation::Min => "Min",
            Aggregation::Max => "Max",
            Aggregation::First => "First",
            Aggregation::Last => "Last",
        }
    }

    pub fn all() -> &'static [Aggregation] {
        &[
            Aggregation::Sum,
            Aggregation::Mean,
            Aggregation::Median,
            Aggregation::Count,
            Aggregation::Min,
            Aggregation::Max,
            Aggregation::First,
            Aggregation::Last,
        ]
    }
}

// ============================================================================
// Transform kinds
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformKind {
    /// Row-wise `left op right` into `result_name`
    ColumnMath {
        op: MathOp,
        left: String,
        right: String,
        result_name: String,
    },
    Normalize {
        method: NormalizeMethod,
        column: String,
    },
    Smooth {
        method: SmoothMethod,
        column: String,
        window: usize,
        /// EWM decay; defaults to `2 / (window + 1)`
        #[serde(default)]
        alpha: Option<f64>,
        #[serde(default)]
        partial_window: bool,
    },
    Resample {
        date_column: String,
        rule: ResampleRule,
        aggregation: Aggregation,
    },
    /// Fill nulls; an empty `columns` list means every eligible column
    Interpolate {
        method: InterpolateMethod,
        #[serde(default)]
        columns: Vec<String>,
    },
    Diff {
        column: String,
        periods: usize,
    },
    PctChange {
        column: String,
        periods: usize,
    },
    Filter {
        expression: String,
    },
    Group {
        by: Vec<String>,
        aggregation: Aggregation,
    },
    ComputedColumn {
        result_name: String,
        expression: String,
    },
}

impl TransformKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransformKind::ColumnMath { .. } => "Column Math",
            TransformKind::Normalize { .. } => "Normalize",
            TransformKind::Smooth { .. } => "Smooth",
            TransformKind::Resample { .. } => "Resample",
            TransformKind::Interpolate { .. } => "Interpolate",
            TransformKind::Diff { .. } => "Diff",
            TransformKind::PctChange { .. } => "Percent Change",
            TransformKind::Filter { .. } => "Filter",
            TransformKind::Group { .. } => "Group",
            TransformKind::ComputedColumn { .. } => "Computed Column",
        }
    }

    /// One-line description for transform lists
    pub fn summary(&self) -> String {
        match self {
            TransformKind::ColumnMath {
                op,
                left,
                right,
                result_name,
            } => format!("{result_name} = {left} {} {right}", op.symbol()),
            TransformKind::Normalize { method, column } => {
                format!("{} of {column}", method.label())
            }
            TransformKind::Smooth {
                method,
                column,
                window,
                ..
            } => format!("{} of {column} (window {window})", method.label()),
            TransformKind::Resample {
                date_column,
                rule,
                aggregation,
            } => format!("{} {} by {date_column}", rule.label(), aggregation.label()),
            TransformKind::Interpolate { columns, .. } if columns.is_empty() => {
                "Fill gaps in all columns".to_string()
            }
            TransformKind::Interpolate { columns, .. } => {
                format!("Fill gaps in {}", columns.join(", "))
            }
            TransformKind::Diff { column, periods } => format!("Diff of {column} ({periods})"),
            TransformKind::PctChange { column, periods } => {
                format!("% change of {column} ({periods})")
            }
            TransformKind::Filter { expression } => format!("Keep rows where {expression}"),
            TransformKind::Group { by, aggregation } => {
                format!("{} by {}", aggregation.label(), by.join(", "))
            }
            TransformKind::ComputedColumn {
                result_name,
                expression,
            } => format!("{result_name} = {expression}"),
        }
    }

    /// Column this transform writes, when it can create one
    pub fn output_column(&self) -> Option<&str> {
        match self {
            TransformKind::ColumnMath { result_name, .. }
            | TransformKind::ComputedColumn { result_name, .. } => Some(result_name.trim()),
            _ => None,
        }
    }

    /// Rewrite every reference to column `old` as `new`, including
    /// expression text. Returns whether anything changed.
    pub fn rename_column(&mut self, old: &str, new: &str) -> bool {
        let rename = |name: &mut String| {
            let hit = name == old;
            if hit {
                *name = new.to_string();
            }
            hit
        };
        let rewrite = |expression: &mut String| match expr::rename_identifier(expression, old, new) {
            Some(rewritten) => {
                *expression = rewritten;
                true
            }
            None => false,
        };
        match self {
            TransformKind::ColumnMath {
                left,
                right,
                result_name,
                ..
            } => rename(left) | rename(right) | rename(result_name),
            TransformKind::Normalize { column, .. }
            | TransformKind::Smooth { column, .. }
            | TransformKind::Diff { column, .. }
            | TransformKind::PctChange { column, .. } => rename(column),
            TransformKind::Resample { date_column, .. } => rename(date_column),
            TransformKind::Interpolate { columns: names, .. }
            | TransformKind::Group { by: names, .. } => {
                names.iter_mut().fold(false, |changed, name| rename(name) | changed)
            }
            TransformKind::Filter { expression } => rewrite(expression),
            TransformKind::ComputedColumn {
                result_name,
                expression,
            } => rename(result_name) | rewrite(expression),
        }
    }
}
