//! Row-collapsing transforms: Group and Resample

use super::column_ops::require_column;
use super::error::TransformError;
use super::stats;
use super::{Aggregation, ResampleRule};
use crate::constants::MAX_RESAMPLE_PERIODS;
use crate::data::{CellKey, ColumnType, DataCell, DataRow, TabularDataset};
use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{BTreeMap, HashMap};

type TransformResult<T> = Result<T, TransformError>;

/// Collapse a set of rows into one cell for column `col`
fn aggregate(
    dataset: &TabularDataset,
    rows: &[usize],
    col: usize,
    aggregation: Aggregation,
) -> DataCell {
    let column_type = dataset.columns()[col].column_type;
    let cells: Vec<&DataCell> = rows
        .iter()
        .filter_map(|&r| dataset.rows()[r].get(col))
        .filter(|c| !c.is_empty())
        .collect();

    if !column_type.is_numeric() {
        return cells.first().map(|c| (*c).clone()).unwrap_or(DataCell::Empty);
    }

    let values: Vec<f64> = cells.iter().filter_map(|c| c.as_f64()).collect();
    let pick = |better: fn(f64, f64) -> bool| {
        cells
            .iter()
            .copied()
            .filter(|c| c.as_f64().is_some())
            .reduce(|best, c| match (c.as_f64(), best.as_f64()) {
                (Some(x), Some(y)) if better(x, y) => c,
                _ => best,
            })
            .cloned()
            .unwrap_or(DataCell::Empty)
    };

    match aggregation {
        Aggregation::Sum if column_type == ColumnType::Integer => cells
            .iter()
            .try_fold(0i64, |acc, c| match c {
                DataCell::Integer(n) => acc.checked_add(*n),
                _ => None,
            })
            .map(DataCell::Integer)
            .unwrap_or(DataCell::Empty),
        Aggregation::Sum => DataCell::float(values.iter().sum()),
        Aggregation::Mean => stats::mean(&values).map(DataCell::float).unwrap_or(DataCell::Empty),
        Aggregation::Median => stats::median(&values)
            .map(DataCell::float)
            .unwrap_or(DataCell::Empty),
        Aggregation::Count => DataCell::Integer(cells.len() as i64),
        Aggregation::Min => pick(|x, y| x < y),
        Aggregation::Max => pick(|x, y| x > y),
        Aggregation::First => cells.first().map(|c| (*c).clone()).unwrap_or(DataCell::Empty),
        Aggregation::Last => cells.last().map(|c| (*c).clone()).unwrap_or(DataCell::Empty),
    }
}

// ============================================================================
// Group
// ============================================================================

pub(crate) fn group(
    dataset: &TabularDataset,
    by: &[String],
    aggregation: Aggregation,
) -> TransformResult<TabularDataset> {
    if by.is_empty() {
        return Err(TransformError::InvalidParameter(
            "at least one group column is required".to_string(),
        ));
    }
    let key_cols = by
        .iter()
        .map(|name| require_column(dataset, name))
        .collect::<TransformResult<Vec<usize>>>()?;

    // Group rows by key, preserving first-occurrence order
    let mut group_order: Vec<Vec<CellKey>> = Vec::new();
    let mut groups: HashMap<Vec<CellKey>, Vec<usize>> = HashMap::new();
    for (i, row) in dataset.rows().iter().enumerate() {
        let key: Vec<CellKey> = key_cols
            .iter()
            .map(|&c| row.get(c).map(DataCell::key).unwrap_or(CellKey::Empty))
            .collect();
        if !groups.contains_key(&key) {
            group_order.push(key.clone());
        }
        groups.entry(key).or_default().push(i);
    }

    let rows = group_order
        .iter()
        .filter_map(|key| groups.get(key))
        .map(|members| {
            let cells = (0..dataset.column_count())
                .map(|col| {
                    if key_cols.contains(&col) {
                        members
                            .first()
                            .and_then(|&r| dataset.rows()[r].get(col))
                            .cloned()
                            .unwrap_or(DataCell::Empty)
                    } else {
                        aggregate(dataset, members, col, aggregation)
                    }
                })
                .collect();
            DataRow::new(cells)
        })
        .collect();
    Ok(dataset.with_rows(rows)?)
}

// ============================================================================
// Resample
// ============================================================================

fn period_start(date: NaiveDate, rule: ResampleRule) -> Option<NaiveDate> {
    match rule {
        ResampleRule::Daily => Some(date),
        ResampleRule::Weekly => {
            date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        }
        ResampleRule::Monthly => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
        ResampleRule::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1),
    }
}

fn next_period(start: NaiveDate, rule: ResampleRule) -> Option<NaiveDate> {
    match rule {
        ResampleRule::Daily => start.checked_add_days(Days::new(1)),
        ResampleRule::Weekly => start.checked_add_days(Days::new(7)),
        ResampleRule::Monthly => start.checked_add_months(Months::new(1)),
        ResampleRule::Yearly => start.checked_add_months(Months::new(12)),
    }
}

pub(crate) fn resample(
    dataset: &TabularDataset,
    date_column: &str,
    rule: ResampleRule,
    aggregation: Aggregation,
) -> TransformResult<TabularDataset> {
    let date_col = require_column(dataset, date_column)?;
    let column_type = dataset.columns()[date_col].column_type;
    if column_type != ColumnType::DateTime {
        return Err(TransformError::type_mismatch(date_column, "datetime", column_type));
    }

    let out_of_range = || TransformError::InvalidParameter("date out of range".to_string());

    let mut buckets: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (i, row) in dataset.rows().iter().enumerate() {
        let Some(dt) = row.get(date_col).and_then(DataCell::as_datetime) else {
            continue;
        };
        let start = period_start(dt.date(), rule).ok_or_else(out_of_range)?;
        buckets.entry(start).or_default().push(i);
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Ok(dataset.with_rows(Vec::new())?);
    };

    let mut periods: Vec<NaiveDate> = Vec::new();
    let mut current = first;
    while current <= last {
        if periods.len() >= MAX_RESAMPLE_PERIODS {
            return Err(TransformError::InvalidParameter(format!(
                "resampling produces more than {MAX_RESAMPLE_PERIODS} periods"
            )));
        }
        periods.push(current);
        current = next_period(current, rule).ok_or_else(out_of_range)?;
    }

    let empty = Vec::new();
    let rows = periods
        .into_iter()
        .map(|start| {
            let members = buckets.get(&start).unwrap_or(&empty);
            let cells = (0..dataset.column_count())
                .map(|col| {
                    if col == date_col {
                        DataCell::DateTime(NaiveDateTime::new(start, NaiveTime::MIN))
                    } else {
                        aggregate(dataset, members, col, aggregation)
                    }
                })
                .collect();
            DataRow::new(cells)
        })
        .collect();
    Ok(dataset.with_rows(rows)?)
}
