//! Plotly figure renderer
//!
//! Produces a figure as plain JSON (`{"data": [...], "layout": {...}}`) in
//! the shape plotly.js accepts, so the artifact can be written to disk or
//! handed to any plotly front end without this crate linking a plotting
//! library.

use super::chart_data::{prepare_chart_data, ChartData, SeriesData};
use super::{RenderError, RenderResult, Renderer};
use crate::data::{DataCell, TabularDataset};
use crate::transform::stats;
use crate::types::{
    Annotation, AnnotationKind, AxisAssignment, AxisConfig, AxisScale, ChartConfig, ChartKind,
    Coord, LegendPosition, LineStyle, MarkerStyle, Theme, ThemeMode,
};
use serde_json::{json, Value};

/// Points sampled along a density curve
const KDE_POINTS: usize = 200;

#[derive(Clone, Copy, Debug, Default)]
pub struct PlotlyRenderer;

impl Renderer for PlotlyRenderer {
    type Artifact = Value;

    fn name(&self) -> &'static str {
        "plotly"
    }

    fn render(
        &self,
        dataset: &TabularDataset,
        chart: &ChartConfig,
        theme: &Theme,
    ) -> RenderResult<(Value, Vec<String>)> {
        if dataset.row_count() == 0 {
            return Err(RenderError::NothingToPlot("dataset has no rows".to_string()));
        }

        let data = prepare_chart_data(dataset, chart, theme);
        let mut warnings = data.warnings.clone();
        let secondary = chart.uses_secondary_axis();

        let mut traces = Vec::with_capacity(data.series.len());
        for (index, series) in data.series.iter().enumerate() {
            match trace(chart.kind, &data, series, index) {
                Some(mut trace) => {
                    if secondary && series.style.axis == AxisAssignment::Secondary {
                        trace["yaxis"] = json!("y2");
                    }
                    traces.push(trace);
                }
                None => warnings.push(format!(
                    "Column '{}' has too few distinct values for a density curve",
                    series.style.source_column
                )),
            }
        }

        let figure = json!({
            "data": traces,
            "layout": layout(chart, theme, &data, secondary),
        });
        Ok((figure, warnings))
    }
}

// ============================================================================
// Traces
// ============================================================================

fn trace(kind: ChartKind, data: &ChartData, series: &SeriesData, index: usize) -> Option<Value> {
    let style = &series.style;
    let x: Vec<Value> = data.x_values.iter().map(cell_json).collect();
    let y: Vec<Value> = series.values.iter().map(|v| json!(v)).collect();
    let mut line = json!({
        "color": series.color,
        "width": style.line_width,
        "dash": dash(style.line_style),
    });
    let marker = json!({
        "color": series.color,
        "size": style.marker_size,
        "symbol": marker_symbol(style.marker).unwrap_or("circle"),
    });

    let mut trace = match kind {
        ChartKind::Line | ChartKind::Step => {
            if kind == ChartKind::Step {
                line["shape"] = json!("hv");
            }
            let with_markers = style.marker != MarkerStyle::None;
            let mut trace = json!({
                "type": "scatter",
                "mode": if with_markers { "lines+markers" } else { "lines" },
                "x": x,
                "y": y,
                "line": line,
            });
            if with_markers {
                trace["marker"] = marker;
            }
            trace
        }
        ChartKind::Area => json!({
            "type": "scatter",
            "mode": "lines",
            "x": x,
            "y": y,
            "line": line,
            "fill": if index == 0 { "tozeroy" } else { "tonexty" },
        }),
        ChartKind::Scatter => json!({
            "type": "scatter",
            "mode": "markers",
            "x": x,
            "y": y,
            "marker": marker,
        }),
        ChartKind::Bar | ChartKind::StackedBar | ChartKind::Bar100 => json!({
            "type": "bar",
            "x": x,
            "y": y,
            "marker": { "color": series.color },
        }),
        ChartKind::Histogram => json!({
            "type": "histogram",
            "x": series.present_values(),
            "marker": { "color": series.color },
        }),
        ChartKind::Kde => {
            let (xs, ys) = density_curve(&series.present_values())?;
            json!({
                "type": "scatter",
                "mode": "lines",
                "x": xs,
                "y": ys,
                "line": line,
                "fill": "tozeroy",
            })
        }
        ChartKind::Box => json!({
            "type": "box",
            "y": series.present_values(),
            "marker": { "color": series.color },
            "boxmean": true,
        }),
        ChartKind::Violin => json!({
            "type": "violin",
            "y": series.present_values(),
            "line": { "color": series.color },
            "box": { "visible": true },
            "meanline": { "visible": true },
        }),
    };
    trace["name"] = json!(series.label);
    trace["opacity"] = json!(style.alpha);
    Some(trace)
}

/// Gaussian kernel density estimate with Scott's bandwidth. `None` when the
/// values have no spread.
fn density_curve(values: &[f64]) -> Option<(Vec<f64>, Vec<f64>)> {
    if values.len() < 2 {
        return None;
    }
    let std = stats::population_std(values)?;
    if std <= 0.0 {
        return None;
    }
    let n = values.len() as f64;
    let bandwidth = std * n.powf(-0.2);
    let lo = stats::min(values)? - 3.0 * bandwidth;
    let hi = stats::max(values)? + 3.0 * bandwidth;
    let step = (hi - lo) / (KDE_POINTS - 1) as f64;
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    let xs: Vec<f64> = (0..KDE_POINTS).map(|i| lo + step * i as f64).collect();
    let ys = xs
        .iter()
        .map(|x| {
            let sum: f64 = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum();
            sum * norm
        })
        .collect();
    Some((xs, ys))
}

fn cell_json(cell: &DataCell) -> Value {
    match cell {
        DataCell::Integer(n) => json!(n),
        DataCell::Float(f) => json!(f),
        DataCell::Text(s) => json!(s),
        DataCell::DateTime(dt) => json!(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        DataCell::Boolean(b) => json!(b),
        DataCell::Empty => Value::Null,
    }
}

fn coord_json(coord: &Coord) -> Value {
    match coord {
        Coord::Number(n) => json!(n),
        Coord::DateTime(dt) => json!(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        Coord::Category(s) => json!(s),
    }
}

fn dash(style: LineStyle) -> &'static str {
    match style {
        LineStyle::Solid => "solid",
        LineStyle::Dashed => "dash",
        LineStyle::Dotted => "dot",
        LineStyle::DashDot => "dashdot",
    }
}

fn marker_symbol(marker: MarkerStyle) -> Option<&'static str> {
    match marker {
        MarkerStyle::None => None,
        MarkerStyle::Circle => Some("circle"),
        MarkerStyle::Square => Some("square"),
        MarkerStyle::Triangle => Some("triangle-up"),
        MarkerStyle::Diamond => Some("diamond"),
        MarkerStyle::Cross => Some("x"),
        MarkerStyle::Plus => Some("cross"),
        MarkerStyle::Star => Some("star"),
    }
}

// ============================================================================
// Layout
// ============================================================================

fn layout(chart: &ChartConfig, theme: &Theme, data: &ChartData, secondary: bool) -> Value {
    let (width, height) = chart.figure.pixels();
    let x_title = if chart.axes.x.label.is_empty() {
        data.x_label.as_str()
    } else {
        chart.axes.x.label.as_str()
    };
    let title = if chart.subtitle.is_empty() {
        chart.title.clone()
    } else {
        format!("{}<br><sup>{}</sup>", chart.title, chart.subtitle)
    };

    let mut shapes = Vec::new();
    let mut notes = Vec::new();
    for annotation in chart.annotations.iter().filter(|a| a.enabled) {
        push_annotation(annotation, &mut shapes, &mut notes);
    }

    let mut layout = json!({
        "title": { "text": title, "font": { "size": theme.title_font_size } },
        "template": if theme.mode == ThemeMode::Dark { "plotly_dark" } else { "plotly_white" },
        "font": {
            "family": theme.font_family,
            "size": theme.font_size,
            "color": theme.text_color,
        },
        "paper_bgcolor": theme.background_color,
        "plot_bgcolor": theme.background_color,
        "showlegend": chart.legend.show,
        "width": width,
        "height": height,
        "xaxis": axis_json(&chart.axes.x, x_title, theme),
        "yaxis": axis_json(&chart.axes.y_primary, &chart.axes.y_primary.label, theme),
        "shapes": shapes,
        "annotations": notes,
    });

    if secondary {
        let mut y2 = axis_json(&chart.axes.y_secondary, &chart.axes.y_secondary.label, theme);
        y2["overlaying"] = json!("y");
        y2["side"] = json!("right");
        layout["yaxis2"] = y2;
    }
    match chart.kind {
        ChartKind::Bar => layout["barmode"] = json!("group"),
        ChartKind::StackedBar => layout["barmode"] = json!("stack"),
        ChartKind::Bar100 => {
            layout["barmode"] = json!("stack");
            layout["barnorm"] = json!("percent");
        }
        _ => {}
    }
    if let Some(legend) = legend_json(chart.legend.position) {
        layout["legend"] = legend;
    }
    layout
}

fn axis_json(axis: &AxisConfig, title: &str, theme: &Theme) -> Value {
    let mut value = json!({
        "title": { "text": title },
        "type": match axis.scale {
            AxisScale::Linear => "linear",
            AxisScale::Log => "log",
        },
        "showgrid": axis.show_grid,
        "gridcolor": theme.grid_color,
    });
    match (axis.min, axis.max) {
        (Some(min), Some(max)) => {
            // Log axis ranges are given in exponents
            let (min, max) = match axis.scale {
                AxisScale::Linear => (min, max),
                AxisScale::Log => (min.log10(), max.log10()),
            };
            value["range"] = if axis.invert { json!([max, min]) } else { json!([min, max]) };
        }
        _ if axis.invert => value["autorange"] = json!("reversed"),
        _ => {}
    }
    value
}

fn legend_json(position: LegendPosition) -> Option<Value> {
    let (x, y, xanchor, yanchor) = match position {
        LegendPosition::Best => return None,
        LegendPosition::UpperRight => (1.0, 1.0, "right", "top"),
        LegendPosition::UpperLeft => (0.0, 1.0, "left", "top"),
        LegendPosition::LowerLeft => (0.0, 0.0, "left", "bottom"),
        LegendPosition::LowerRight => (1.0, 0.0, "right", "bottom"),
        LegendPosition::Right => (1.02, 0.5, "left", "middle"),
        LegendPosition::Center => (0.5, 0.5, "center", "middle"),
    };
    Some(json!({ "x": x, "y": y, "xanchor": xanchor, "yanchor": yanchor }))
}

fn push_annotation(annotation: &Annotation, shapes: &mut Vec<Value>, notes: &mut Vec<Value>) {
    match &annotation.kind {
        AnnotationKind::HorizontalLine { y, label, color, line_style } => {
            shapes.push(json!({
                "type": "line",
                "xref": "paper", "x0": 0, "x1": 1,
                "yref": "y", "y0": y, "y1": y,
                "line": { "color": color, "dash": dash(*line_style) },
                "opacity": 0.7,
            }));
            if !label.is_empty() {
                notes.push(json!({
                    "xref": "paper", "x": 1, "xanchor": "right",
                    "yref": "y", "y": y, "yanchor": "bottom",
                    "text": label,
                    "showarrow": false,
                    "font": { "color": color },
                }));
            }
        }
        AnnotationKind::VerticalLine { x, label, color, line_style } => {
            shapes.push(json!({
                "type": "line",
                "xref": "x", "x0": coord_json(x), "x1": coord_json(x),
                "yref": "paper", "y0": 0, "y1": 1,
                "line": { "color": color, "dash": dash(*line_style) },
                "opacity": 0.7,
            }));
            if !label.is_empty() {
                notes.push(json!({
                    "xref": "x", "x": coord_json(x), "xanchor": "left",
                    "yref": "paper", "y": 1,
                    "text": label,
                    "showarrow": false,
                    "font": { "color": color },
                }));
            }
        }
        AnnotationKind::Span { x_min, x_max, color, alpha } => shapes.push(json!({
            "type": "rect",
            "xref": "x", "x0": coord_json(x_min), "x1": coord_json(x_max),
            "yref": "paper", "y0": 0, "y1": 1,
            "fillcolor": color,
            "opacity": alpha,
            "line": { "width": 0 },
            "layer": "below",
        })),
        AnnotationKind::Band { y_min, y_max, color, alpha } => shapes.push(json!({
            "type": "rect",
            "xref": "paper", "x0": 0, "x1": 1,
            "yref": "y", "y0": y_min, "y1": y_max,
            "fillcolor": color,
            "opacity": alpha,
            "line": { "width": 0 },
            "layer": "below",
        })),
        AnnotationKind::Text { x, y, text, font_size, color } => notes.push(json!({
            "x": coord_json(x),
            "y": y,
            "text": text,
            "showarrow": false,
            "font": { "size": font_size, "color": color },
            "bgcolor": "rgba(245, 222, 179, 0.5)",
        })),
        AnnotationKind::Arrow { x, y, dx, dy, text, color } => {
            // Head at (x, y), text at (x + dx, y + dy). A horizontal offset
            // only exists for numeric x.
            let mut note = json!({
                "x": coord_json(x),
                "y": y,
                "text": text,
                "showarrow": true,
                "arrowhead": 2,
                "arrowcolor": color,
                "ayref": "y",
                "ay": y + dy,
                "bgcolor": "rgba(245, 222, 179, 0.5)",
            });
            match x {
                Coord::Number(n) => {
                    note["axref"] = json!("x");
                    note["ax"] = json!(n + dx);
                }
                _ => note["ax"] = json!(0),
            }
            notes.push(note);
        }
    }
}
