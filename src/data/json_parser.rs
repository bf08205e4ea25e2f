//! JSON data parsing
//!
//! Parses JSON arrays of objects into datasets and writes datasets back as
//! arrays of records.

use crate::constants::DEFAULT_DATASET_NAME;
use crate::data::cell::{ColumnType, DataCell};
use crate::data::dataset::{DataOrigin, TabularDataset};
use crate::data::error::{DataError, DataResult};
use crate::data::infer::build_dataset;
use serde_json::{Map, Number, Value};
use std::path::Path;

/// Parse a JSON file into a dataset named after the file
pub fn parse_json_file(path: &Path) -> DataResult<TabularDataset> {
    let content = std::fs::read_to_string(path)?;
    let ds = parse_json_content(&content)?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_DATASET_NAME)
        .to_string();

    Ok(ds.with_name(name).with_origin(DataOrigin::Json {
        path: Some(path.to_path_buf()),
    }))
}

/// Parse JSON content from a string
///
/// Columns come from the keys of the first object; values are run through
/// the same inference as delimited text.
pub fn parse_json_content(json: &str) -> DataResult<TabularDataset> {
    let value: Value = serde_json::from_str(json)?;
    let array = extract_array(&value)?;
    let origin = DataOrigin::Json { path: None };

    let Some(first) = array.first() else {
        return Ok(TabularDataset::new(DEFAULT_DATASET_NAME, vec![], vec![])?.with_origin(origin));
    };
    let first_obj = first
        .as_object()
        .ok_or_else(|| DataError::InvalidData("Array elements must be objects".to_string()))?;
    let headers: Vec<String> = first_obj.keys().cloned().collect();

    let rows: Vec<Vec<String>> = array
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            headers
                .iter()
                .map(|key| obj.get(key).map(json_value_to_text).unwrap_or_default())
                .collect()
        })
        .collect();

    build_dataset(DEFAULT_DATASET_NAME.to_string(), &headers, &rows, origin)
}

/// Extract the array from JSON value, handling common wrapper patterns
fn extract_array(value: &Value) -> DataResult<&Vec<Value>> {
    match value {
        Value::Array(arr) => Ok(arr),
        Value::Object(obj) => {
            let wrapper_keys = ["data", "rows", "items", "records", "results"];
            wrapper_keys
                .iter()
                .find_map(|key| match obj.get(*key) {
                    Some(Value::Array(arr)) => Some(arr),
                    _ => None,
                })
                .ok_or_else(|| {
                    DataError::InvalidData(
                        "JSON must be an array or have a data/rows/items/records/results array"
                            .to_string(),
                    )
                })
        }
        _ => Err(DataError::InvalidData(
            "JSON must be an array of objects".to_string(),
        )),
    }
}

/// Flatten a JSON value to the text the inference step consumes
fn json_value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => arr
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Write a dataset to a JSON file as an array of records
pub fn write_json_file(dataset: &TabularDataset, path: &Path) -> DataResult<()> {
    std::fs::write(path, write_json_records(dataset)?)?;
    Ok(())
}

/// Convert a dataset to a pretty-printed array of objects
pub fn write_json_records(dataset: &TabularDataset) -> DataResult<String> {
    let records: Vec<Map<String, Value>> = dataset
        .rows()
        .iter()
        .map(|row| {
            dataset
                .columns()
                .iter()
                .zip(&row.cells)
                .map(|(col, cell)| (col.name.clone(), cell_to_json_value(cell, col.column_type)))
                .collect()
        })
        .collect();

    Ok(serde_json::to_string_pretty(&records)?)
}

/// Convert a cell to a JSON value
fn cell_to_json_value(cell: &DataCell, column_type: ColumnType) -> Value {
    match cell {
        DataCell::Integer(n) => Value::Number(Number::from(*n)),
        DataCell::Float(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        DataCell::Boolean(b) => Value::Bool(*b),
        DataCell::Text(s) => Value::String(s.clone()),
        DataCell::DateTime(_) => Value::String(cell.to_string()),
        DataCell::Empty if column_type == ColumnType::Text => Value::String(String::new()),
        DataCell::Empty => Value::Null,
    }
}
