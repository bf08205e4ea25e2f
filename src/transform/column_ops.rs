//! Row-wise and column-wise transforms that keep the row count
//! (plus Filter, which only drops rows).

use super::error::TransformError;
use super::expr::{BoundExpr, ExpressionError, Scalar};
use super::stats;
use super::{InterpolateMethod, MathOp, NormalizeMethod};
use crate::data::{ColumnType, DataCell, TabularDataset};

type TransformResult<T> = Result<T, TransformError>;

/// Index of an existing column
pub(crate) fn require_column(dataset: &TabularDataset, name: &str) -> TransformResult<usize> {
    dataset
        .column_index(name)
        .ok_or_else(|| TransformError::ColumnNotFound(name.to_string()))
}

/// Index of an existing numeric column
pub(crate) fn numeric_column(dataset: &TabularDataset, name: &str) -> TransformResult<usize> {
    let idx = require_column(dataset, name)?;
    let column_type = dataset.columns()[idx].column_type;
    if !column_type.is_numeric() {
        return Err(TransformError::type_mismatch(name, "numeric", column_type));
    }
    Ok(idx)
}

fn result_name(name: &str) -> TransformResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TransformError::InvalidParameter(
            "result column name is empty".to_string(),
        ));
    }
    Ok(name)
}

fn column_values(dataset: &TabularDataset, idx: usize) -> Vec<Option<f64>> {
    dataset.column_cells(idx).map(DataCell::as_f64).collect()
}

fn replace_column(
    dataset: &TabularDataset,
    name: &str,
    cells: Vec<DataCell>,
    fallback: ColumnType,
) -> TransformResult<TabularDataset> {
    let mut out = dataset.clone();
    out.put_column(name, cells, fallback)?;
    Ok(out)
}

// ============================================================================
// ColumnMath
// ============================================================================

pub(crate) fn column_math(
    dataset: &TabularDataset,
    op: MathOp,
    left: &str,
    right: &str,
    result: &str,
) -> TransformResult<TabularDataset> {
    let result = result_name(result)?;
    let l = numeric_column(dataset, left)?;
    let r = numeric_column(dataset, right)?;
    let cells = dataset
        .rows()
        .iter()
        .map(|row| match (row.get(l), row.get(r)) {
            (Some(a), Some(b)) => math_cell(op, a, b),
            _ => DataCell::Empty,
        })
        .collect();
    replace_column(dataset, result, cells, ColumnType::Float)
}

fn math_cell(op: MathOp, a: &DataCell, b: &DataCell) -> DataCell {
    if let (DataCell::Integer(x), DataCell::Integer(y)) = (a, b) {
        let exact = match op {
            MathOp::Add => Some(x.checked_add(*y)),
            MathOp::Sub => Some(x.checked_sub(*y)),
            MathOp::Mul => Some(x.checked_mul(*y)),
            MathOp::Div => None,
        };
        if let Some(value) = exact {
            return value.map(DataCell::Integer).unwrap_or(DataCell::Empty);
        }
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(_), Some(y)) if op == MathOp::Div && y == 0.0 => DataCell::Empty,
        (Some(x), Some(y)) => DataCell::float(match op {
            MathOp::Add => x + y,
            MathOp::Sub => x - y,
            MathOp::Mul => x * y,
            MathOp::Div => x / y,
        }),
        _ => DataCell::Empty,
    }
}

// ============================================================================
// Normalize
// ============================================================================

pub(crate) fn normalize(
    dataset: &TabularDataset,
    method: NormalizeMethod,
    column: &str,
) -> TransformResult<TabularDataset> {
    let idx = numeric_column(dataset, column)?;
    let values = column_values(dataset, idx);
    let present: Vec<f64> = values.iter().flatten().copied().collect();

    // (center, scale); a zero scale maps every value to 0
    let (center, scale) = match method {
        NormalizeMethod::MinMax => {
            let min = stats::min(&present).unwrap_or(0.0);
            let max = stats::max(&present).unwrap_or(0.0);
            (min, max - min)
        }
        NormalizeMethod::ZScore => (
            stats::mean(&present).unwrap_or(0.0),
            stats::population_std(&present).unwrap_or(0.0),
        ),
        NormalizeMethod::Robust => {
            let q1 = stats::quantile(&present, 0.25).unwrap_or(0.0);
            let q3 = stats::quantile(&present, 0.75).unwrap_or(0.0);
            (stats::median(&present).unwrap_or(0.0), q3 - q1)
        }
    };

    let cells = values
        .into_iter()
        .map(|v| match v {
            None => DataCell::Empty,
            Some(_) if scale == 0.0 => DataCell::Float(0.0),
            Some(v) => DataCell::float((v - center) / scale),
        })
        .collect();
    replace_column(dataset, column, cells, ColumnType::Float)
}

// ============================================================================
// Diff / PctChange
// ============================================================================

fn check_periods(periods: usize) -> TransformResult<()> {
    if periods == 0 {
        return Err(TransformError::InvalidParameter(
            "periods must be at least 1".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn diff(
    dataset: &TabularDataset,
    column: &str,
    periods: usize,
) -> TransformResult<TabularDataset> {
    check_periods(periods)?;
    let idx = numeric_column(dataset, column)?;
    let cells: Vec<&DataCell> = dataset.column_cells(idx).collect();
    let out = (0..cells.len())
        .map(|i| {
            let Some(prev) = i.checked_sub(periods).map(|p| cells[p]) else {
                return DataCell::Empty;
            };
            match (cells[i], prev) {
                (DataCell::Integer(x), DataCell::Integer(y)) => {
                    x.checked_sub(*y).map(DataCell::Integer).unwrap_or(DataCell::Empty)
                }
                (a, b) => match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => DataCell::float(x - y),
                    _ => DataCell::Empty,
                },
            }
        })
        .collect();
    replace_column(dataset, column, out, dataset.columns()[idx].column_type)
}

pub(crate) fn pct_change(
    dataset: &TabularDataset,
    column: &str,
    periods: usize,
) -> TransformResult<TabularDataset> {
    check_periods(periods)?;
    let idx = numeric_column(dataset, column)?;
    let values = column_values(dataset, idx);
    let out = (0..values.len())
        .map(|i| {
            let prev = i.checked_sub(periods).and_then(|p| values[p]);
            match (values[i], prev) {
                (Some(_), Some(prev)) if prev == 0.0 => DataCell::Empty,
                (Some(x), Some(prev)) => DataCell::float((x - prev) / prev * 100.0),
                _ => DataCell::Empty,
            }
        })
        .collect();
    replace_column(dataset, column, out, ColumnType::Float)
}

// ============================================================================
// Interpolate
// ============================================================================

pub(crate) fn interpolate(
    dataset: &TabularDataset,
    method: InterpolateMethod,
    columns: &[String],
) -> TransformResult<TabularDataset> {
    let targets: Vec<String> = if columns.is_empty() {
        dataset
            .columns()
            .iter()
            .filter(|c| method != InterpolateMethod::Linear || c.column_type.is_numeric())
            .map(|c| c.name.clone())
            .collect()
    } else {
        for name in columns {
            match method {
                InterpolateMethod::Linear => numeric_column(dataset, name)?,
                _ => require_column(dataset, name)?,
            };
        }
        columns.to_vec()
    };

    let mut out = dataset.clone();
    for name in &targets {
        let idx = require_column(&out, name)?;
        let column_type = out.columns()[idx].column_type;
        let cells: Vec<DataCell> = out.column_cells(idx).cloned().collect();
        let filled = match method {
            InterpolateMethod::Linear => linear_fill(&cells),
            InterpolateMethod::ForwardFill => forward_fill(cells),
            InterpolateMethod::BackwardFill => {
                let mut reversed = cells;
                reversed.reverse();
                let mut filled = forward_fill(reversed);
                filled.reverse();
                filled
            }
        };
        out.put_column(name, filled, column_type)?;
    }
    Ok(out)
}

fn forward_fill(cells: Vec<DataCell>) -> Vec<DataCell> {
    let mut last: Option<DataCell> = None;
    cells
        .into_iter()
        .map(|cell| {
            if cell.is_empty() {
                last.clone().unwrap_or(DataCell::Empty)
            } else {
                last = Some(cell.clone());
                cell
            }
        })
        .collect()
}

/// Linear by row position between known values; trailing gaps repeat the
/// last value, leading gaps stay null. Cells come back untouched when there
/// is no gap after the first known value.
fn linear_fill(cells: &[DataCell]) -> Vec<DataCell> {
    let values: Vec<Option<f64>> = cells.iter().map(DataCell::as_f64).collect();
    let known: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_some()).collect();
    let Some(&first) = known.first() else {
        return cells.to_vec();
    };
    if values[first..].iter().all(Option::is_some) {
        return cells.to_vec();
    }
    let mut out: Vec<DataCell> = values
        .iter()
        .map(|v| v.map(DataCell::float).unwrap_or(DataCell::Empty))
        .collect();

    for pair in known.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (Some(va), Some(vb)) = (values[a], values[b]) else {
            continue;
        };
        for (i, cell) in out.iter_mut().enumerate().take(b).skip(a + 1) {
            let t = (i - a) as f64 / (b - a) as f64;
            *cell = DataCell::float(va + (vb - va) * t);
        }
    }
    if let Some(&last) = known.last() {
        let fill = out[last].clone();
        for cell in out.iter_mut().skip(last + 1) {
            *cell = fill.clone();
        }
    }
    out
}

// ============================================================================
// Filter / ComputedColumn
// ============================================================================

pub(crate) fn filter(dataset: &TabularDataset, expression: &str) -> TransformResult<TabularDataset> {
    let bound = BoundExpr::compile(expression, dataset)?;
    let keep = dataset
        .rows()
        .iter()
        .map(|row| match bound.eval_row(row)? {
            Scalar::Bool(keep) => Ok(keep),
            Scalar::Null => Ok(false),
            other => Err(ExpressionError::NotBoolean(other.type_name())),
        })
        .collect::<Result<Vec<bool>, _>>()?;
    let mut out = dataset.clone();
    out.retain_rows(&keep);
    Ok(out)
}

pub(crate) fn computed_column(
    dataset: &TabularDataset,
    result: &str,
    expression: &str,
) -> TransformResult<TabularDataset> {
    let result = result_name(result)?;
    let bound = BoundExpr::compile(expression, dataset)?;
    let cells = dataset
        .rows()
        .iter()
        .map(|row| bound.eval_row(row).map(Scalar::into_cell))
        .collect::<Result<Vec<_>, _>>()?;
    replace_column(dataset, result, cells, ColumnType::Float)
}
