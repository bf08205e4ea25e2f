//! Trailing-window smoothing and exponential weighting

use super::column_ops::numeric_column;
use super::error::TransformError;
use super::stats;
use super::SmoothMethod;
use crate::data::{ColumnType, DataCell, TabularDataset};

pub(crate) fn smooth(
    dataset: &TabularDataset,
    method: SmoothMethod,
    column: &str,
    window: usize,
    alpha: Option<f64>,
    partial_window: bool,
) -> Result<TabularDataset, TransformError> {
    if window == 0 {
        return Err(TransformError::InvalidParameter(
            "window must be at least 1".to_string(),
        ));
    }
    let idx = numeric_column(dataset, column)?;
    let values: Vec<Option<f64>> = dataset.column_cells(idx).map(DataCell::as_f64).collect();

    let smoothed = match method {
        SmoothMethod::Ewm => {
            let alpha = alpha.unwrap_or(2.0 / (window as f64 + 1.0));
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(TransformError::InvalidParameter(format!(
                    "alpha must be in (0, 1], got {alpha}"
                )));
            }
            ewm(&values, alpha)
        }
        _ => rolling(&values, window, partial_window, |w| match method {
            SmoothMethod::RollingMedian => stats::median(w),
            SmoothMethod::RollingSum => Some(w.iter().sum()),
            SmoothMethod::RollingStd => stats::population_std(w),
            SmoothMethod::RollingMin => stats::min(w),
            SmoothMethod::RollingMax => stats::max(w),
            _ => stats::mean(w),
        }),
    };

    let cells = smoothed
        .into_iter()
        .map(|v| v.map(DataCell::float).unwrap_or(DataCell::Empty))
        .collect();
    let mut out = dataset.clone();
    out.put_column(column, cells, ColumnType::Float)?;
    Ok(out)
}

/// Apply `reduce` to each trailing window, skipping nulls inside it.
/// Without `partial` the first `window - 1` rows are null.
fn rolling(
    values: &[Option<f64>],
    window: usize,
    partial: bool,
    reduce: impl Fn(&[f64]) -> Option<f64>,
) -> Vec<Option<f64>> {
    let mut present = Vec::with_capacity(window);
    (0..values.len())
        .map(|i| {
            if !partial && i + 1 < window {
                return None;
            }
            let start = (i + 1).saturating_sub(window);
            present.clear();
            present.extend(values[start..=i].iter().flatten());
            if present.is_empty() {
                return None;
            }
            reduce(&present)
        })
        .collect()
}

/// Recursive exponential weighting. Null rows stay null and leave the
/// running average untouched.
fn ewm(values: &[Option<f64>], alpha: f64) -> Vec<Option<f64>> {
    let mut state: Option<f64> = None;
    values
        .iter()
        .map(|v| {
            let x = (*v)?;
            let next = match state {
                None => x,
                Some(prev) => alpha * x + (1.0 - alpha) * prev,
            };
            state = Some(next);
            Some(next)
        })
        .collect()
}
