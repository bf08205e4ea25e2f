//! The project aggregate: dataset, pipeline and chart configuration.

use crate::constants::AUTO_SERIES_LIMIT;
use crate::data::TabularDataset;
use crate::transform::{self, PipelineOutput, Transform, TransformId};
use crate::types::{ChartConfig, ChartKind, SeriesStyle, Theme};
use serde::{Deserialize, Serialize};

/// Everything a chart project consists of.
///
/// Values of this type are snapshots: [`crate::app::AppState`] never edits
/// one in place, it builds the next state and keeps the previous one for
/// undo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub dataset: TabularDataset,
    #[serde(default)]
    pub transforms: Vec<Transform>,
    pub chart: ChartConfig,
    #[serde(default)]
    pub theme: Theme,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self::blank()
    }
}

impl ProjectState {
    /// A new project over the blank dataset. It starts without series even
    /// though the blank dataset has columns.
    pub fn blank() -> Self {
        Self {
            dataset: TabularDataset::blank(),
            transforms: Vec::new(),
            chart: ChartConfig::new(ChartKind::Line),
            theme: Theme::default(),
        }
    }

    /// A new project over `dataset` with series created for its numeric
    /// columns. The first column becomes the X column.
    pub fn from_dataset(dataset: TabularDataset) -> Self {
        Self::from_dataset_with_limit(dataset, AUTO_SERIES_LIMIT)
    }

    pub fn from_dataset_with_limit(dataset: TabularDataset, series_limit: usize) -> Self {
        let mut project = Self {
            dataset,
            ..Self::blank()
        };
        project.populate_series(series_limit);
        project
    }

    /// Point the chart at the current dataset: first column as X and one
    /// series per numeric column. Does nothing for the blank dataset.
    pub fn populate_series(&mut self, limit: usize) {
        self.chart.x_column = None;
        self.chart.series.clear();
        if self.dataset.is_blank() {
            return;
        }

        let x = self.dataset.column_names().next().map(str::to_string);
        let series = self
            .dataset
            .numeric_columns()
            .filter(|name| Some(*name) != x.as_deref())
            .take(limit)
            .enumerate()
            .map(|(i, name)| SeriesStyle::new(name).with_color(self.theme.color_for(i)))
            .collect();
        self.chart.x_column = x;
        self.chart.series = series;
    }

    /// Copy of this project over a different dataset
    pub(crate) fn with_dataset(&self, dataset: TabularDataset) -> Self {
        Self {
            dataset,
            transforms: self.transforms.clone(),
            chart: self.chart.clone(),
            theme: self.theme.clone(),
        }
    }

    /// Run the pipeline over the dataset
    pub fn transformed(&self) -> PipelineOutput {
        transform::apply(&self.dataset, &self.transforms)
    }

    pub fn transform(&self, id: TransformId) -> Option<&Transform> {
        self.transforms.iter().find(|t| t.id == id)
    }

    pub(crate) fn transform_index(&self, id: TransformId) -> Option<usize> {
        self.transforms.iter().position(|t| t.id == id)
    }

    /// Series whose source column is missing from `post_transform`
    pub fn dangling_series<'a>(&'a self, post_transform: &TabularDataset) -> Vec<&'a SeriesStyle> {
        self.chart
            .series
            .iter()
            .filter(|s| !post_transform.has_column(&s.source_column))
            .collect()
    }
}
