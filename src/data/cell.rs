//! Cell values and column types.
//!
//! A [`DataCell`] is one typed value (or null) inside a dataset row. Column
//! types are advisory: they are recomputed from the cells on structural edits
//! and checked by transforms that need numeric or datetime input.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported column types
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    #[default]
    Text,
    DateTime,
    Boolean,
}

impl ColumnType {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::DateTime => "datetime",
            ColumnType::Boolean => "boolean",
        }
    }

    pub fn all() -> &'static [ColumnType] {
        &[
            ColumnType::Integer,
            ColumnType::Float,
            ColumnType::Text,
            ColumnType::DateTime,
            ColumnType::Boolean,
        ]
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Value given to cells of this type that were not set explicitly
    pub fn default_cell(&self) -> DataCell {
        match self {
            ColumnType::Integer => DataCell::Integer(0),
            ColumnType::Float => DataCell::Float(0.0),
            ColumnType::Text => DataCell::Text(String::new()),
            ColumnType::DateTime | ColumnType::Boolean => DataCell::Empty,
        }
    }

    /// Unify the types of the non-null cells of a column.
    ///
    /// Integers widen to float when mixed with floats; any other mixture is
    /// text. A column without values keeps `current`.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a DataCell>, current: ColumnType) -> ColumnType {
        let mut inferred: Option<ColumnType> = None;
        for cell in cells {
            let Some(kind) = cell.kind() else {
                continue;
            };
            inferred = Some(match (inferred, kind) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(ColumnType::Integer), ColumnType::Float)
                | (Some(ColumnType::Float), ColumnType::Integer) => ColumnType::Float,
                _ => return ColumnType::Text,
            });
        }
        inferred.unwrap_or(current)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single cell value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCell {
    Integer(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
    Boolean(bool),
    Empty,
}

impl DataCell {
    /// Build a float cell; NaN and infinities become null
    pub fn float(value: f64) -> Self {
        if value.is_finite() {
            DataCell::Float(value)
        } else {
            DataCell::Empty
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        DataCell::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DataCell::Empty)
    }

    /// The type this value belongs to, `None` for null
    pub fn kind(&self) -> Option<ColumnType> {
        match self {
            DataCell::Integer(_) => Some(ColumnType::Integer),
            DataCell::Float(_) => Some(ColumnType::Float),
            DataCell::Text(_) => Some(ColumnType::Text),
            DataCell::DateTime(_) => Some(ColumnType::DateTime),
            DataCell::Boolean(_) => Some(ColumnType::Boolean),
            DataCell::Empty => None,
        }
    }

    /// Numeric value of integer and float cells
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataCell::Integer(n) => Some(*n as f64),
            DataCell::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            DataCell::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Parse user-entered text for a cell edit.
    ///
    /// Tries integer, then float, then boolean or datetime when the column
    /// already has that type, and falls back to text. Empty input is null.
    pub fn parse_edit(raw: &str, existing: ColumnType) -> Self {
        let value = raw.trim();
        if value.is_empty() {
            return DataCell::Empty;
        }
        if let Ok(n) = value.parse::<i64>() {
            return DataCell::Integer(n);
        }
        if let Some(n) = parse_finite_float(value) {
            return DataCell::Float(n);
        }
        match existing {
            ColumnType::Boolean => {
                if let Some(b) = parse_bool(value) {
                    return DataCell::Boolean(b);
                }
            }
            ColumnType::DateTime => {
                if let Some(dt) = parse_datetime(value) {
                    return DataCell::DateTime(dt);
                }
            }
            _ => {}
        }
        DataCell::Text(raw.to_string())
    }

    /// Parse a string into a DataCell of an already inferred column type,
    /// keeping the raw text when it does not fit.
    pub fn parse_typed(value: &str, hint: ColumnType) -> Self {
        if value.is_empty() {
            return DataCell::Empty;
        }

        let parsed = match hint {
            ColumnType::Integer => value.parse::<i64>().ok().map(DataCell::Integer),
            ColumnType::Float => parse_finite_float(value).map(DataCell::Float),
            ColumnType::Boolean => parse_bool(value).map(DataCell::Boolean),
            ColumnType::DateTime => parse_datetime(value).map(DataCell::DateTime),
            ColumnType::Text => None,
        };
        parsed.unwrap_or_else(|| DataCell::Text(value.to_string()))
    }

    pub(crate) fn key(&self) -> CellKey {
        match self {
            DataCell::Integer(n) => CellKey::Integer(*n),
            // -0.0 and 0.0 belong to the same group
            DataCell::Float(n) if *n == 0.0 => CellKey::Float(0.0f64.to_bits()),
            DataCell::Float(n) => CellKey::Float(n.to_bits()),
            DataCell::Text(s) => CellKey::Text(s.clone()),
            DataCell::DateTime(dt) => CellKey::DateTime(*dt),
            DataCell::Boolean(b) => CellKey::Boolean(*b),
            DataCell::Empty => CellKey::Empty,
        }
    }
}

impl fmt::Display for DataCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataCell::Integer(n) => write!(f, "{n}"),
            DataCell::Float(n) => write!(f, "{n}"),
            DataCell::Text(s) => f.write_str(s),
            DataCell::DateTime(dt) => {
                if dt.time() == NaiveTime::MIN {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S"))
                }
            }
            DataCell::Boolean(b) => write!(f, "{b}"),
            DataCell::Empty => Ok(()),
        }
    }
}

/// Hashable identity of a cell, used for grouping
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum CellKey {
    Integer(i64),
    Float(u64),
    Text(String),
    DateTime(NaiveDateTime),
    Boolean(bool),
    Empty,
}

fn parse_finite_float(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse boolean spellings accepted in cells
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse the date and datetime layouts accepted in cells
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}
