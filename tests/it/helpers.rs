//! Test helpers and builders for reducing boilerplate in tests.
//!
//! - `TestProjectBuilder` - builder for projects with columns, transforms
//!   and series
//! - `dataset()`, `ints()`, `floats()` - quick dataset construction
//! - `column()` / `assert_column()` - reading cells back out

#![allow(dead_code)]

use graphsmith::data::{DataCell, TabularDataset};
use graphsmith::project::ProjectState;
use graphsmith::transform::{Transform, TransformKind};
use graphsmith::types::SeriesStyle;

// ============================================================================
// Datasets
// ============================================================================

/// Integer cells; `None` is a null cell
pub fn ints(values: &[Option<i64>]) -> Vec<DataCell> {
    values
        .iter()
        .map(|v| v.map(DataCell::Integer).unwrap_or(DataCell::Empty))
        .collect()
}

/// Float cells; `None` is a null cell
pub fn floats(values: &[Option<f64>]) -> Vec<DataCell> {
    values
        .iter()
        .map(|v| v.map(DataCell::float).unwrap_or(DataCell::Empty))
        .collect()
}

pub fn texts(values: &[&str]) -> Vec<DataCell> {
    values.iter().map(|v| DataCell::text(*v)).collect()
}

/// Build a dataset from named columns, inferring column types
pub fn dataset(columns: Vec<(&str, Vec<DataCell>)>) -> TabularDataset {
    TabularDataset::from_columns(
        "test",
        columns
            .into_iter()
            .map(|(name, cells)| (name.to_string(), cells))
            .collect(),
    )
    .unwrap()
}

/// `{A: [4, 2], B: [2, 0]}`
pub fn division_dataset() -> TabularDataset {
    dataset(vec![
        ("A", ints(&[Some(4), Some(2)])),
        ("B", ints(&[Some(2), Some(0)])),
    ])
}

/// Cells of column `name`
pub fn column(ds: &TabularDataset, name: &str) -> Vec<DataCell> {
    let idx = ds
        .column_index(name)
        .unwrap_or_else(|| panic!("missing column {name:?} in {:?}", ds.column_names().collect::<Vec<_>>()));
    ds.column_cells(idx).cloned().collect()
}

pub fn assert_column(ds: &TabularDataset, name: &str, expected: Vec<DataCell>) {
    assert_eq!(column(ds, name), expected, "column {name:?}");
}

// ============================================================================
// TestProjectBuilder - Builder pattern for creating test projects
// ============================================================================

/// Builder for projects.
///
/// # Example
/// ```ignore
/// let project = TestProjectBuilder::new()
///     .with_column("X", ints(&[Some(1), Some(2)]))
///     .with_column("Y", floats(&[Some(0.5), None]))
///     .with_series("Y")
///     .build();
/// ```
#[derive(Default)]
pub struct TestProjectBuilder {
    columns: Vec<(String, Vec<DataCell>)>,
    transforms: Vec<Transform>,
    series: Vec<SeriesStyle>,
    x_column: Option<String>,
}

impl TestProjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: &str, cells: Vec<DataCell>) -> Self {
        self.columns.push((name.to_string(), cells));
        self
    }

    pub fn with_transform(mut self, kind: TransformKind) -> Self {
        self.transforms.push(Transform::new(kind));
        self
    }

    pub fn with_series(mut self, column: &str) -> Self {
        self.series.push(SeriesStyle::new(column));
        self
    }

    pub fn with_x_column(mut self, column: &str) -> Self {
        self.x_column = Some(column.to_string());
        self
    }

    /// Build without automatic series; only the series added explicitly
    pub fn build(self) -> ProjectState {
        let dataset = TabularDataset::from_columns("test", self.columns).unwrap();
        let mut project = ProjectState::from_dataset_with_limit(dataset, 0);
        project.chart.x_column = self.x_column;
        project.chart.series = self.series;
        project.transforms = self.transforms;
        project
    }
}

/// Project over `{X: 1..=3, A: [1, 2, 3], B: [10, 20, 30]}` plotting A and B
pub fn sample_project() -> ProjectState {
    TestProjectBuilder::new()
        .with_column("X", ints(&[Some(1), Some(2), Some(3)]))
        .with_column("A", ints(&[Some(1), Some(2), Some(3)]))
        .with_column("B", ints(&[Some(10), Some(20), Some(30)]))
        .with_x_column("X")
        .with_series("A")
        .with_series("B")
        .build()
}
