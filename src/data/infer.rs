//! Column type inference for imported text.
//!
//! Importers hand over a header row plus raw string rows; this module picks
//! one type per column and converts every value into a typed cell.

use crate::data::cell::{parse_bool, parse_datetime, ColumnType, DataCell};
use crate::data::dataset::{ColumnDef, DataOrigin, DataRow, TabularDataset};
use crate::data::error::{DataError, DataResult};
use std::collections::HashSet;

/// Check if a string looks like a number
///
/// Accepts a single currency or percent symbol and at most one thousands
/// separator.
///
/// # Examples
/// - `"123"` -> true
/// - `"$123.45"` -> true
/// - `"1,2,3"` -> false (too many separators)
/// - `"abc"` -> false
pub(crate) fn looks_like_number(s: &str) -> bool {
    clean_number(s).is_some()
}

/// Strip currency, percent and thousands symbols from a numeric string
fn clean_number(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let symbol_count = trimmed
        .chars()
        .filter(|c| matches!(c, '$' | '%' | '€' | '£'))
        .count();
    if symbol_count > 1 || trimmed.matches(',').count() > 1 {
        return None;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '$' | '%' | '€' | '£' | ','))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|_| cleaned)
}

/// Infer the type of one column from all of its non-empty raw values
pub(crate) fn infer_column_type(values: &[&str]) -> ColumnType {
    let sample: Vec<&str> = values
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if sample.is_empty() {
        return ColumnType::Text;
    }

    if sample
        .iter()
        .all(|s| clean_number(s).is_some_and(|n| n.parse::<i64>().is_ok()))
    {
        return ColumnType::Integer;
    }
    if sample.iter().all(|s| looks_like_number(s)) {
        return ColumnType::Float;
    }
    if sample.iter().all(|s| parse_bool(s).is_some()) {
        return ColumnType::Boolean;
    }
    if sample.iter().all(|s| parse_datetime(s).is_some()) {
        return ColumnType::DateTime;
    }
    ColumnType::Text
}

/// Convert one raw value into a cell of the inferred column type
pub(crate) fn import_cell(value: &str, column_type: ColumnType) -> DataCell {
    let value = value.trim();
    if column_type.is_numeric() {
        if let Some(cleaned) = clean_number(value) {
            return DataCell::parse_typed(&cleaned, column_type);
        }
    }
    DataCell::parse_typed(value, column_type)
}

/// Make header names usable as column names: blanks get a positional name,
/// repeats get a numeric suffix
pub(crate) fn normalize_headers(headers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let base = match raw.trim() {
                "" => format!("Column{}", i + 1),
                name => name.to_string(),
            };
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{base}.{n}");
                n += 1;
            }
            name
        })
        .collect()
}

/// Build a typed dataset from a header row and raw rows.
///
/// Short rows are padded with nulls and long rows truncated.
pub(crate) fn build_dataset(
    name: String,
    headers: &[String],
    raw_rows: &[Vec<String>],
    origin: DataOrigin,
) -> DataResult<TabularDataset> {
    if headers.is_empty() {
        return Err(DataError::NoColumns);
    }
    let names = normalize_headers(headers);

    let columns: Vec<ColumnDef> = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let values: Vec<&str> = raw_rows
                .iter()
                .filter_map(|row| row.get(i).map(String::as_str))
                .collect();
            ColumnDef::new(name, infer_column_type(&values))
        })
        .collect();

    let rows = raw_rows
        .iter()
        .map(|row| {
            DataRow::new(
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        row.get(i)
                            .map(|v| import_cell(v, col.column_type))
                            .unwrap_or(DataCell::Empty)
                    })
                    .collect(),
            )
        })
        .collect();

    Ok(TabularDataset::new(name, columns, rows)?.with_origin(origin))
}
