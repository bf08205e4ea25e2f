//! Chart data preparation
//!
//! Resolves the columns a chart refers to into plain vectors so renderers
//! never look up columns themselves. Problems with individual series are
//! reported as warnings and the series is left out.

use crate::data::{DataCell, TabularDataset};
use crate::types::{ChartConfig, SeriesStyle, Theme};

/// Everything a renderer needs to draw the series of one chart
#[derive(Clone, Debug, PartialEq)]
pub struct ChartData {
    /// X axis title: the X column name, or empty for row positions
    pub x_label: String,
    /// One value per row; row positions when no usable X column is set
    pub x_values: Vec<DataCell>,
    pub series: Vec<SeriesData>,
    pub warnings: Vec<String>,
}

/// One visible, numeric series
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesData {
    pub label: String,
    pub color: String,
    pub style: SeriesStyle,
    /// One value per row; null and non-finite cells are `None`
    pub values: Vec<Option<f64>>,
}

impl SeriesData {
    /// Non-null values, in row order
    pub fn present_values(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Smallest and largest plotted value across all series
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .fold(None, |range, &v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Resolve `chart` against `dataset`.
///
/// Colors come from the series style or, failing that, from the theme
/// palette by the series' position in the chart configuration.
pub fn prepare_chart_data(dataset: &TabularDataset, chart: &ChartConfig, theme: &Theme) -> ChartData {
    let mut warnings = Vec::new();

    let x_index = chart
        .x_column
        .as_deref()
        .and_then(|name| dataset.column_index(name));
    let (x_label, x_values) = match x_index {
        Some(col) => (
            dataset.columns()[col].name.clone(),
            dataset.column_cells(col).cloned().collect(),
        ),
        None => {
            if !chart.kind.is_distribution() {
                warnings.push("X column not specified or not found".to_string());
            }
            let positions = (0..dataset.row_count())
                .map(|i| DataCell::Integer(i64::try_from(i).unwrap_or(i64::MAX)))
                .collect();
            (String::new(), positions)
        }
    };

    let mut series = Vec::new();
    for (i, style) in chart.series.iter().enumerate() {
        if !style.visible {
            continue;
        }
        let Some(col) = dataset.column_index(&style.source_column) else {
            warnings.push(format!("Column '{}' not found", style.source_column));
            continue;
        };
        if !dataset.columns()[col].column_type.is_numeric() {
            warnings.push(format!("Column '{}' is not numeric", style.source_column));
            continue;
        }

        let color = style
            .color
            .clone()
            .unwrap_or_else(|| theme.color_for(i).to_string());
        let values = dataset
            .column_cells(col)
            .map(|cell| cell.as_f64().filter(|v| v.is_finite()))
            .collect();
        series.push(SeriesData {
            label: style.display_label().to_string(),
            color,
            style: style.clone(),
            values,
        });
    }

    ChartData {
        x_label,
        x_values,
        series,
        warnings,
    }
}
