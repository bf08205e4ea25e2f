//! AppState: the single owner of the current project and its history.

use super::error::{StateError, StateResult};
use super::history::History;
use super::observers::{ObserverRegistry, Subscription};
use super::propagation;
use crate::data::{ColumnType, TabularDataset};
use crate::perf::ScopedTimer;
use crate::project::ProjectState;
use crate::render::{render_with_threshold, RenderOutput, RenderResult, Renderer};
use crate::settings::Settings;
use crate::transform::{PipelineOutput, Transform, TransformId, TransformKind};
use crate::types::{
    Annotation, AnnotationId, AnnotationKind, AxisConfig, AxisId, ChartKind, FigureSize,
    LegendConfig, SeriesStyle, Theme, ThemeMode,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Owns one [`ProjectState`] plus bounded undo/redo history.
///
/// Every mutation is validated first. A rejected mutation leaves the
/// project, the history and the observers untouched. A committed mutation
/// records the previous project for undo, clears redo, recomputes the
/// pipeline output and then notifies observers with the new project.
pub struct AppState {
    project: ProjectState,
    pipeline: PipelineOutput,
    history: History<ProjectState>,
    observers: ObserverRegistry,
    auto_series_limit: usize,
    default_theme: ThemeMode,
    slow_operation_ms: f64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::blank()
    }
}

impl AppState {
    pub fn new(project: ProjectState) -> Self {
        Self::build(project, &Settings::default())
    }

    /// Like [`AppState::new`] with history limit, auto-series limit, default
    /// theme and slow-operation threshold taken from `settings`
    pub fn with_settings(project: ProjectState, settings: &Settings) -> Self {
        Self::build(project, settings)
    }

    pub fn blank() -> Self {
        Self::new(ProjectState::blank())
    }

    fn build(project: ProjectState, settings: &Settings) -> Self {
        let mut state = Self {
            pipeline: PipelineOutput::unchanged(project.dataset.clone()),
            project,
            history: History::new(settings.history_limit.max(1)),
            observers: ObserverRegistry::default(),
            auto_series_limit: settings.auto_series_limit,
            default_theme: settings.default_theme,
            slow_operation_ms: settings.slow_operation_ms,
        };
        state.refresh();
        state
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn project(&self) -> &ProjectState {
        &self.project
    }

    /// Pipeline output for the current project
    pub fn transformed(&self) -> &PipelineOutput {
        &self.pipeline
    }

    /// Series whose column is missing after the pipeline ran
    pub fn dangling_series(&self) -> Vec<&SeriesStyle> {
        self.project.dangling_series(&self.pipeline.dataset)
    }

    /// Render the pipeline output with the current chart and theme, warning
    /// above the configured slow-operation threshold
    pub fn render<R: Renderer>(&self, renderer: &R) -> RenderResult<RenderOutput<R::Artifact>> {
        render_with_threshold(
            renderer,
            &self.pipeline.dataset,
            &self.project.chart,
            &self.project.theme,
            self.slow_operation_ms,
        )
    }

    pub fn slow_operation_ms(&self) -> f64 {
        self.slow_operation_ms
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_len(&self) -> usize {
        self.history.undo_len()
    }

    pub fn redo_len(&self) -> usize {
        self.history.redo_len()
    }

    pub fn history_limit(&self) -> usize {
        self.history.capacity()
    }

    /// Register `listener` to receive every newly committed project
    pub fn subscribe(&self, listener: impl Fn(&ProjectState) + Send + Sync + 'static) -> Subscription {
        self.observers.subscribe(Arc::new(listener))
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ========================================================================
    // Commit, undo, redo
    // ========================================================================

    fn commit<F>(&mut self, operation: &'static str, mutate: F) -> StateResult<()>
    where
        F: FnOnce(&ProjectState) -> StateResult<ProjectState>,
    {
        let next = match mutate(&self.project) {
            Ok(next) => next,
            Err(e) => return Err(self.reject(operation, e)),
        };
        let previous = std::mem::replace(&mut self.project, next);
        self.history.record(previous);
        self.refresh();
        debug!(
            operation,
            undo = self.history.undo_len(),
            redo = self.history.redo_len(),
            "Committed"
        );
        self.observers.notify(&self.project);
        Ok(())
    }

    fn reject(&self, operation: &'static str, error: StateError) -> StateError {
        debug!(operation, "Mutation rejected: {}", error);
        error
    }

    fn refresh(&mut self) {
        let _timer = ScopedTimer::new("pipeline refresh", self.slow_operation_ms);
        self.pipeline = self.project.transformed();
    }

    pub fn undo(&mut self) -> StateResult<()> {
        if !self.history.undo(&mut self.project) {
            return Err(StateError::NothingToUndo);
        }
        self.refresh();
        debug!(undo = self.history.undo_len(), redo = self.history.redo_len(), "Undo");
        self.observers.notify(&self.project);
        Ok(())
    }

    pub fn redo(&mut self) -> StateResult<()> {
        if !self.history.redo(&mut self.project) {
            return Err(StateError::NothingToRedo);
        }
        self.refresh();
        debug!(undo = self.history.undo_len(), redo = self.history.redo_len(), "Redo");
        self.observers.notify(&self.project);
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start over with a blank project. Clears history.
    pub fn new_project(&mut self) {
        let mut project = ProjectState::blank();
        project.theme = Theme::for_mode(self.default_theme);
        self.replace_project(project);
    }

    /// Adopt a project loaded from disk. Clears history.
    pub fn replace_project(&mut self, project: ProjectState) {
        self.project = project;
        self.history.clear();
        self.refresh();
        info!(
            dataset = self.project.dataset.name(),
            rows = self.project.dataset.row_count(),
            "Project replaced"
        );
        self.observers.notify(&self.project);
    }

    // ========================================================================
    // Dataset
    // ========================================================================

    /// Replace the dataset, keeping the chart and pipeline as they are
    pub fn set_dataset(&mut self, dataset: TabularDataset) -> StateResult<()> {
        self.commit("set dataset", |p| Ok(p.with_dataset(dataset)))
    }

    /// Replace the dataset and point the chart at its columns. Transforms
    /// are kept.
    pub fn import_dataset(&mut self, dataset: TabularDataset) -> StateResult<()> {
        let limit = self.auto_series_limit;
        self.commit("import dataset", |p| {
            let mut next = p.with_dataset(dataset);
            next.populate_series(limit);
            Ok(next)
        })
    }

    pub fn insert_row(&mut self, index: usize) -> StateResult<()> {
        self.commit("insert row", |p| Ok(p.with_dataset(p.dataset.insert_row(index)?)))
    }

    pub fn delete_row(&mut self, index: usize) -> StateResult<()> {
        self.commit("delete row", |p| Ok(p.with_dataset(p.dataset.delete_row(index)?)))
    }

    /// Append a column, returning its generated name
    pub fn add_column(&mut self, column_type: ColumnType) -> StateResult<String> {
        let mut added = String::new();
        self.commit("add column", |p| {
            let (dataset, name) = p.dataset.add_column(column_type);
            added = name;
            Ok(p.with_dataset(dataset))
        })?;
        Ok(added)
    }

    pub fn set_cell(&mut self, row: usize, column: &str, raw: &str) -> StateResult<()> {
        self.commit("set cell", |p| Ok(p.with_dataset(p.dataset.set_cell(row, column, raw)?)))
    }

    /// Rename a column along with every series, X selection and transform
    /// that refers to it
    pub fn rename_column(&mut self, old: &str, new: &str) -> StateResult<()> {
        let produced: Vec<String> = self.pipeline.dataset.column_names().map(str::to_string).collect();
        self.commit("rename column", |p| {
            propagation::rename_column(p, produced.iter().map(String::as_str), old, new)
        })
    }

    /// Delete a column and every series plotting it
    pub fn delete_column(&mut self, name: &str) -> StateResult<()> {
        self.commit("delete column", |p| propagation::delete_column(p, name))
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    pub fn set_transforms(&mut self, transforms: Vec<Transform>) -> StateResult<()> {
        self.commit("set transforms", |p| {
            let mut next = p.clone();
            next.transforms = transforms;
            Ok(next)
        })
    }

    /// Append an enabled transform, returning its id
    pub fn add_transform(&mut self, kind: TransformKind) -> StateResult<TransformId> {
        let transform = Transform::new(kind);
        let id = transform.id;
        self.commit("add transform", |p| {
            let mut next = p.clone();
            next.transforms.push(transform);
            Ok(next)
        })?;
        Ok(id)
    }

    pub fn update_transform(&mut self, id: TransformId, kind: TransformKind) -> StateResult<()> {
        self.commit("update transform", |p| {
            let mut next = p.clone();
            let index = transform_index(p, id)?;
            next.transforms[index].kind = kind;
            Ok(next)
        })
    }

    pub fn remove_transform(&mut self, id: TransformId) -> StateResult<()> {
        self.commit("remove transform", |p| {
            let mut next = p.clone();
            let index = transform_index(p, id)?;
            next.transforms.remove(index);
            Ok(next)
        })
    }

    /// Move a transform to position `to` in the pipeline
    pub fn move_transform(&mut self, id: TransformId, to: usize) -> StateResult<()> {
        self.commit("move transform", |p| {
            let len = p.transforms.len();
            if to >= len {
                return Err(StateError::TransformOutOfRange { index: to, len });
            }
            let mut next = p.clone();
            let transform = next.transforms.remove(transform_index(p, id)?);
            next.transforms.insert(to, transform);
            Ok(next)
        })
    }

    pub fn set_transform_enabled(&mut self, id: TransformId, enabled: bool) -> StateResult<()> {
        self.commit("toggle transform", |p| {
            let mut next = p.clone();
            next.transforms[transform_index(p, id)?].enabled = enabled;
            Ok(next)
        })
    }

    // ========================================================================
    // Chart
    // ========================================================================

    pub fn set_chart_kind(&mut self, kind: ChartKind) -> StateResult<()> {
        self.commit("set chart kind", |p| {
            let mut next = p.clone();
            next.chart.kind = kind;
            Ok(next)
        })
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> StateResult<()> {
        let title = title.into();
        self.commit("set title", |p| {
            let mut next = p.clone();
            next.chart.title = title;
            Ok(next)
        })
    }

    pub fn set_subtitle(&mut self, subtitle: impl Into<String>) -> StateResult<()> {
        let subtitle = subtitle.into();
        self.commit("set subtitle", |p| {
            let mut next = p.clone();
            next.chart.subtitle = subtitle;
            Ok(next)
        })
    }

    pub fn set_legend(&mut self, legend: LegendConfig) -> StateResult<()> {
        self.commit("set legend", |p| {
            let mut next = p.clone();
            next.chart.legend = legend;
            Ok(next)
        })
    }

    pub fn set_figure(&mut self, figure: FigureSize) -> StateResult<()> {
        if let Err(reason) = figure.validate() {
            return Err(self.reject("set figure", StateError::InvalidFigure(reason)));
        }
        self.commit("set figure", |p| {
            let mut next = p.clone();
            next.chart.figure = figure;
            Ok(next)
        })
    }

    /// Select the X column, or row position when `None`
    pub fn set_x_column(&mut self, column: Option<&str>) -> StateResult<()> {
        if let Some(column) = column {
            self.require_output_column("set x column", column)?;
        }
        let column = column.map(str::to_string);
        self.commit("set x column", |p| {
            let mut next = p.clone();
            next.chart.x_column = column;
            Ok(next)
        })
    }

    /// Insert or replace the series for `style.source_column`
    pub fn set_series_style(&mut self, style: SeriesStyle) -> StateResult<()> {
        self.check_series("set series style", &style)?;
        self.commit("set series style", |p| {
            let mut next = p.clone();
            match next
                .chart
                .series
                .iter_mut()
                .find(|s| s.source_column == style.source_column)
            {
                Some(existing) => *existing = style,
                None => next.chart.series.push(style),
            }
            Ok(next)
        })
    }

    /// Plot `column` with default styling and the next palette color
    pub fn add_series(&mut self, column: &str) -> StateResult<()> {
        if self.project.chart.series_for(column).is_some() {
            let error = StateError::InvalidSeries {
                column: column.to_string(),
                reason: "column is already plotted".to_string(),
            };
            return Err(self.reject("add series", error));
        }
        let color = self.project.theme.color_for(self.project.chart.series.len()).to_string();
        let style = SeriesStyle::new(column).with_color(color);
        self.check_series("add series", &style)?;
        self.commit("add series", |p| {
            let mut next = p.clone();
            next.chart.series.push(style);
            Ok(next)
        })
    }

    pub fn remove_series(&mut self, column: &str) -> StateResult<()> {
        self.commit("remove series", |p| {
            if p.chart.series_for(column).is_none() {
                return Err(StateError::SeriesNotFound(column.to_string()));
            }
            let mut next = p.clone();
            next.chart.series.retain(|s| s.source_column != column);
            Ok(next)
        })
    }

    /// Remove series whose column no longer exists after the pipeline,
    /// returning how many were removed. Nothing is committed when there is
    /// nothing to remove.
    pub fn prune_dangling_series(&mut self) -> StateResult<usize> {
        let dangling: Vec<String> = self
            .dangling_series()
            .into_iter()
            .map(|s| s.source_column.clone())
            .collect();
        if dangling.is_empty() {
            return Ok(0);
        }
        self.commit("prune series", |p| {
            let mut next = p.clone();
            next.chart.series.retain(|s| !dangling.contains(&s.source_column));
            Ok(next)
        })?;
        Ok(dangling.len())
    }

    pub fn set_axis(&mut self, axis: AxisId, config: AxisConfig) -> StateResult<()> {
        if let Err(reason) = config.validate() {
            let error = StateError::InvalidAxis {
                axis: axis.label(),
                reason,
            };
            return Err(self.reject("set axis", error));
        }
        self.commit("set axis", |p| {
            let mut next = p.clone();
            *next.chart.axes.get_mut(axis) = config;
            Ok(next)
        })
    }

    // ========================================================================
    // Annotations
    // ========================================================================

    pub fn add_annotation(&mut self, annotation: Annotation) -> StateResult<AnnotationId> {
        if let Err(reason) = annotation.validate() {
            return Err(self.reject("add annotation", StateError::InvalidAnnotation(reason)));
        }
        let id = annotation.id;
        self.commit("add annotation", |p| {
            let mut next = p.clone();
            next.chart.annotations.push(annotation);
            Ok(next)
        })?;
        Ok(id)
    }

    pub fn update_annotation(&mut self, id: AnnotationId, kind: AnnotationKind) -> StateResult<()> {
        self.commit("update annotation", |p| {
            let mut next = p.clone();
            let annotation = annotation_mut(&mut next, id)?;
            let updated = Annotation {
                kind,
                ..annotation.clone()
            };
            updated.validate().map_err(StateError::InvalidAnnotation)?;
            *annotation = updated;
            Ok(next)
        })
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) -> StateResult<()> {
        self.commit("remove annotation", |p| {
            if p.chart.annotation(id).is_none() {
                return Err(StateError::AnnotationNotFound(id));
            }
            let mut next = p.clone();
            next.chart.annotations.retain(|a| a.id != id);
            Ok(next)
        })
    }

    pub fn set_annotation_enabled(&mut self, id: AnnotationId, enabled: bool) -> StateResult<()> {
        self.commit("toggle annotation", |p| {
            let mut next = p.clone();
            annotation_mut(&mut next, id)?.enabled = enabled;
            Ok(next)
        })
    }

    // ========================================================================
    // Theme
    // ========================================================================

    pub fn set_theme(&mut self, theme: Theme) -> StateResult<()> {
        if let Err(reason) = theme.validate() {
            return Err(self.reject("set theme", StateError::InvalidTheme(reason)));
        }
        self.commit("set theme", |p| {
            let mut next = p.clone();
            next.theme = theme;
            Ok(next)
        })
    }

    // ========================================================================
    // Validation helpers
    // ========================================================================

    fn require_output_column(&self, operation: &'static str, column: &str) -> StateResult<()> {
        if self.pipeline.dataset.has_column(column) {
            return Ok(());
        }
        Err(self.reject(operation, StateError::ColumnNotFound(column.to_string())))
    }

    fn check_series(&self, operation: &'static str, style: &SeriesStyle) -> StateResult<()> {
        self.require_output_column(operation, &style.source_column)?;
        style.validate().map_err(|reason| {
            self.reject(
                operation,
                StateError::InvalidSeries {
                    column: style.source_column.clone(),
                    reason,
                },
            )
        })
    }
}

fn transform_index(project: &ProjectState, id: TransformId) -> StateResult<usize> {
    project
        .transform_index(id)
        .ok_or(StateError::TransformNotFound(id))
}

fn annotation_mut(project: &mut ProjectState, id: AnnotationId) -> StateResult<&mut Annotation> {
    project
        .chart
        .annotations
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or(StateError::AnnotationNotFound(id))
}
