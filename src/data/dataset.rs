//! The tabular dataset value.
//!
//! [`TabularDataset`] is immutable from the outside: every public edit
//! returns a new instance and leaves `self` untouched. The transform engine
//! works on its own clones through the crate-internal mutators at the bottom
//! of the impl.

use crate::constants::NEW_COLUMN_BASE_NAME;
use crate::data::cell::{ColumnType, DataCell};
use crate::data::error::{DataError, DataResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Column definition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A row of cells, one per column
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRow {
    pub cells: Vec<DataCell>,
}

impl DataRow {
    pub fn new(cells: Vec<DataCell>) -> Self {
        Self { cells }
    }

    pub fn get(&self, col: usize) -> Option<&DataCell> {
        self.cells.get(col)
    }
}

/// Where a dataset came from
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataOrigin {
    /// Built or edited by hand
    #[default]
    Manual,
    /// The designated blank dataset of a new project
    Blank,
    Csv {
        path: Option<PathBuf>,
        delimiter: char,
    },
    Json {
        path: Option<PathBuf>,
    },
    Clipboard,
    Sample {
        name: String,
    },
}

/// Ordered typed columns plus ordered rows
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct TabularDataset {
    name: String,
    origin: DataOrigin,
    columns: Vec<ColumnDef>,
    rows: Vec<DataRow>,
}

/// Unvalidated wire shape of a dataset
#[derive(Deserialize)]
struct RawDataset {
    name: String,
    #[serde(default)]
    origin: DataOrigin,
    columns: Vec<ColumnDef>,
    rows: Vec<DataRow>,
}

impl TryFrom<RawDataset> for TabularDataset {
    type Error = DataError;

    fn try_from(raw: RawDataset) -> DataResult<Self> {
        Ok(TabularDataset::new(raw.name, raw.columns, raw.rows)?.with_origin(raw.origin))
    }
}

impl TabularDataset {
    /// Build a dataset, checking name uniqueness and row width
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnDef>,
        rows: Vec<DataRow>,
    ) -> DataResult<Self> {
        validate_column_names(&columns)?;
        for (i, row) in rows.iter().enumerate() {
            if row.cells.len() != columns.len() {
                return Err(DataError::InvalidData(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.cells.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self {
            name: name.into(),
            origin: DataOrigin::Manual,
            columns,
            rows,
        })
    }

    /// Build a dataset from named columns of cells, inferring each type
    pub fn from_columns(
        name: impl Into<String>,
        columns: Vec<(String, Vec<DataCell>)>,
    ) -> DataResult<Self> {
        let row_count = columns.first().map(|(_, cells)| cells.len()).unwrap_or(0);
        if let Some((name, cells)) = columns.iter().find(|(_, cells)| cells.len() != row_count) {
            return Err(DataError::InvalidData(format!(
                "column {:?} has {} values, expected {}",
                name,
                cells.len(),
                row_count
            )));
        }

        let defs = columns
            .iter()
            .map(|(name, cells)| ColumnDef::new(name.clone(), ColumnType::infer(cells, ColumnType::Text)))
            .collect();
        let mut rows = vec![DataRow::default(); row_count];
        for (_, cells) in columns {
            for (row, cell) in rows.iter_mut().zip(cells) {
                row.cells.push(cell);
            }
        }
        Self::new(name, defs, rows)
    }

    /// The designated blank dataset of a new project: `{X: [0], Y: [0]}`
    pub fn blank() -> Self {
        Self {
            name: "Blank".to_string(),
            origin: DataOrigin::Blank,
            columns: vec![
                ColumnDef::new("X", ColumnType::Integer),
                ColumnDef::new("Y", ColumnType::Integer),
            ],
            rows: vec![DataRow::new(vec![DataCell::Integer(0), DataCell::Integer(0)])],
        }
    }

    pub fn with_origin(mut self, origin: DataOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &DataOrigin {
        &self.origin
    }

    /// Whether this is the designated blank dataset
    pub fn is_blank(&self) -> bool {
        self.origin == DataOrigin::Blank
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&DataCell> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)
    }

    /// Cells of one column, top to bottom
    pub fn column_cells(&self, col: usize) -> impl Iterator<Item = &DataCell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(col))
    }

    /// Names of the numeric columns, in column order
    pub fn numeric_columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns
            .iter()
            .filter(|c| c.column_type.is_numeric())
            .map(|c| c.name.as_str())
    }

    /// First unused name in `NewColumn, NewColumn1, NewColumn2, ...`
    pub fn next_column_name(&self) -> String {
        if !self.has_column(NEW_COLUMN_BASE_NAME) {
            return NEW_COLUMN_BASE_NAME.to_string();
        }
        (1..)
            .map(|n| format!("{NEW_COLUMN_BASE_NAME}{n}"))
            .find(|name| !self.has_column(name))
            .unwrap_or_else(|| NEW_COLUMN_BASE_NAME.to_string())
    }

    // ========================================================================
    // Edits (each returns a new dataset)
    // ========================================================================

    /// Insert a row of type defaults before `index` (`index == len` appends)
    pub fn insert_row(&self, index: usize) -> DataResult<Self> {
        if index > self.rows.len() {
            return Err(DataError::OutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        let mut next = self.clone();
        let row = DataRow::new(self.columns.iter().map(|c| c.column_type.default_cell()).collect());
        next.rows.insert(index, row);
        Ok(next)
    }

    pub fn delete_row(&self, index: usize) -> DataResult<Self> {
        if index >= self.rows.len() {
            return Err(DataError::OutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        let mut next = self.clone();
        next.rows.remove(index);
        next.retype_all();
        Ok(next)
    }

    /// Append a column named by [`Self::next_column_name`], returning the
    /// new dataset and the chosen name
    pub fn add_column(&self, column_type: ColumnType) -> (Self, String) {
        let name = self.next_column_name();
        let mut next = self.clone();
        next.columns.push(ColumnDef::new(name.clone(), column_type));
        for row in &mut next.rows {
            row.cells.push(column_type.default_cell());
        }
        (next, name)
    }

    pub fn delete_column(&self, name: &str) -> DataResult<Self> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))?;
        let mut next = self.clone();
        next.columns.remove(idx);
        for row in &mut next.rows {
            row.cells.remove(idx);
        }
        Ok(next)
    }

    pub fn rename_column(&self, old: &str, new: &str) -> DataResult<Self> {
        let idx = self
            .column_index(old)
            .ok_or_else(|| DataError::ColumnNotFound(old.to_string()))?;
        let new = new.trim();
        if new.is_empty() {
            return Err(DataError::empty_name());
        }
        // Expressions quote names in backticks and have no escape for them
        if new.contains('`') {
            return Err(DataError::backtick_name(new));
        }
        if self.has_column(new) {
            return Err(DataError::duplicate_name(new));
        }
        let mut next = self.clone();
        next.columns[idx].name = new.to_string();
        Ok(next)
    }

    /// Replace one cell with parsed user text and recompute the column type
    pub fn set_cell(&self, row: usize, column: &str, raw: &str) -> DataResult<Self> {
        let col = self
            .column_index(column)
            .ok_or_else(|| DataError::ColumnNotFound(column.to_string()))?;
        if row >= self.rows.len() {
            return Err(DataError::OutOfRange {
                index: row,
                len: self.rows.len(),
            });
        }
        let mut next = self.clone();
        next.rows[row].cells[col] = DataCell::parse_edit(raw, self.columns[col].column_type);
        next.retype_column(col);
        Ok(next)
    }

    // ========================================================================
    // Crate-internal mutators for the transform engine
    // ========================================================================

    /// Overwrite a column in place, or append it when no column has `name`.
    /// The column type is inferred from `cells`, keeping `fallback` when all
    /// cells are null.
    pub(crate) fn put_column(
        &mut self,
        name: &str,
        cells: Vec<DataCell>,
        fallback: ColumnType,
    ) -> DataResult<()> {
        if cells.len() != self.rows.len() {
            return Err(DataError::InvalidData(format!(
                "column {:?} has {} values, expected {}",
                name,
                cells.len(),
                self.rows.len()
            )));
        }
        let column_type = ColumnType::infer(&cells, fallback);
        match self.column_index(name) {
            Some(idx) => {
                self.columns[idx].column_type = column_type;
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row.cells[idx] = cell;
                }
            }
            None => {
                if name.trim().is_empty() {
                    return Err(DataError::empty_name());
                }
                self.columns.push(ColumnDef::new(name, column_type));
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row.cells.push(cell);
                }
            }
        }
        Ok(())
    }

    /// Keep the rows whose flag is set
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.rows.retain(|_| flags.next().copied().unwrap_or(false));
        self.retype_all();
    }

    /// Same columns and identity, new rows
    pub(crate) fn with_rows(&self, rows: Vec<DataRow>) -> DataResult<Self> {
        let mut next = Self::new(self.name.clone(), self.columns.clone(), rows)?.with_origin(self.origin.clone());
        next.retype_all();
        Ok(next)
    }

    fn retype_column(&mut self, col: usize) {
        let current = self.columns[col].column_type;
        let inferred = ColumnType::infer(self.rows.iter().filter_map(|r| r.get(col)), current);
        self.columns[col].column_type = inferred;
    }

    fn retype_all(&mut self) {
        for col in 0..self.columns.len() {
            self.retype_column(col);
        }
    }
}

fn validate_column_names(columns: &[ColumnDef]) -> DataResult<()> {
    let mut seen = HashSet::new();
    for column in columns {
        if column.name.trim().is_empty() {
            return Err(DataError::empty_name());
        }
        if !seen.insert(column.name.as_str()) {
            return Err(DataError::duplicate_name(&column.name));
        }
    }
    Ok(())
}
