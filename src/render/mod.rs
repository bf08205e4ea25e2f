//! Renderer contract.
//!
//! A renderer turns the post-transform dataset plus the chart configuration
//! and theme into an artifact. It only ever sees shared references, so it
//! cannot change the project it draws. [`render_with_metadata`] wraps any
//! renderer with timing and row counts.

mod chart_data;
mod plotly;

pub use chart_data::{prepare_chart_data, ChartData, SeriesData};
pub use plotly::PlotlyRenderer;

use crate::constants::SLOW_OPERATION_MS;
use crate::data::TabularDataset;
use crate::perf::measure;
use crate::types::{ChartConfig, Theme};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Nothing to plot: {0}")]
    NothingToPlot(String),

    /// Failure inside a rendering backend
    #[error("Render failed: {0}")]
    Backend(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Draws a chart into some artifact type
pub trait Renderer {
    type Artifact;

    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Render `dataset`, returning the artifact and any non-fatal warnings
    fn render(
        &self,
        dataset: &TabularDataset,
        chart: &ChartConfig,
        theme: &Theme,
    ) -> RenderResult<(Self::Artifact, Vec<String>)>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderMetadata {
    pub row_count: usize,
    pub duration_ms: f64,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct RenderOutput<A> {
    pub artifact: A,
    pub metadata: RenderMetadata,
}

/// Run `renderer` and attach row count, duration and warnings
pub fn render_with_metadata<R: Renderer>(
    renderer: &R,
    dataset: &TabularDataset,
    chart: &ChartConfig,
    theme: &Theme,
) -> RenderResult<RenderOutput<R::Artifact>> {
    render_with_threshold(renderer, dataset, chart, theme, SLOW_OPERATION_MS)
}

/// [`render_with_metadata`] warning above `slow_ms` instead of the default
/// threshold
pub fn render_with_threshold<R: Renderer>(
    renderer: &R,
    dataset: &TabularDataset,
    chart: &ChartConfig,
    theme: &Theme,
    slow_ms: f64,
) -> RenderResult<RenderOutput<R::Artifact>> {
    let (result, duration_ms) = measure(|| renderer.render(dataset, chart, theme));
    let (artifact, warnings) = result?;

    if duration_ms > slow_ms {
        warn!(
            renderer = renderer.name(),
            duration_ms = format!("{:.2}", duration_ms),
            "Slow render"
        );
    }
    debug!(
        renderer = renderer.name(),
        rows = dataset.row_count(),
        warnings = warnings.len(),
        "Rendered chart"
    );

    Ok(RenderOutput {
        artifact,
        metadata: RenderMetadata {
            row_count: dataset.row_count(),
            duration_ms,
            warnings,
        },
    })
}
