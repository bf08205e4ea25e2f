//! Chart configuration value objects.
//!
//! Everything a renderer needs besides the dataset: chart kind, per-series
//! styling, the three axes, annotations, legend, figure size and theme.

use crate::constants::{
    DARK_PALETTE, DEFAULT_ANNOTATION_COLOR, DEFAULT_DPI, DEFAULT_FIGURE_SIZE, DEFAULT_LINE_WIDTH,
    DEFAULT_MARKER_SIZE, DEFAULT_PALETTE,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Chart Kinds
// ============================================================================

/// Types of charts available
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Line,
    Area,
    Bar,
    StackedBar,
    /// Stacked bars scaled to 100%
    Bar100,
    Scatter,
    Step,
    Histogram,
    Kde,
    Box,
    Violin,
}

impl ChartKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Line => "Line",
            ChartKind::Area => "Area",
            ChartKind::Bar => "Bar",
            ChartKind::StackedBar => "Stacked Bar",
            ChartKind::Bar100 => "100% Bar",
            ChartKind::Scatter => "Scatter",
            ChartKind::Step => "Step",
            ChartKind::Histogram => "Histogram",
            ChartKind::Kde => "Density",
            ChartKind::Box => "Box",
            ChartKind::Violin => "Violin",
        }
    }

    pub fn all() -> &'static [ChartKind] {
        &[
            ChartKind::Line,
            ChartKind::Area,
            ChartKind::Bar,
            ChartKind::StackedBar,
            ChartKind::Bar100,
            ChartKind::Scatter,
            ChartKind::Step,
            ChartKind::Histogram,
            ChartKind::Kde,
            ChartKind::Box,
            ChartKind::Violin,
        ]
    }

    /// Distribution charts plot each series' values without an x column
    pub fn is_distribution(&self) -> bool {
        matches!(
            self,
            ChartKind::Histogram | ChartKind::Kde | ChartKind::Box | ChartKind::Violin
        )
    }
}

// ============================================================================
// Series
// ============================================================================

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl LineStyle {
    pub fn label(&self) -> &'static str {
        match self {
            LineStyle::Solid => "Solid",
            LineStyle::Dashed => "Dashed",
            LineStyle::Dotted => "Dotted",
            LineStyle::DashDot => "Dash-dot",
        }
    }

    pub fn all() -> &'static [LineStyle] {
        &[LineStyle::Solid, LineStyle::Dashed, LineStyle::Dotted, LineStyle::DashDot]
    }
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStyle {
    #[default]
    None,
    Circle,
    Square,
    Triangle,
    Diamond,
    Cross,
    Plus,
    Star,
}

impl MarkerStyle {
    pub fn label(&self) -> &'static str {
        match self {
            MarkerStyle::None => "None",
            MarkerStyle::Circle => "Circle",
            MarkerStyle::Square => "Square",
            MarkerStyle::Triangle => "Triangle",
            MarkerStyle::Diamond => "Diamond",
            MarkerStyle::Cross => "Cross",
            MarkerStyle::Plus => "Plus",
            MarkerStyle::Star => "Star",
        }
    }

    pub fn all() -> &'static [MarkerStyle] {
        &[
            MarkerStyle::None,
            MarkerStyle::Circle,
            MarkerStyle::Square,
            MarkerStyle::Triangle,
            MarkerStyle::Diamond,
            MarkerStyle::Cross,
            MarkerStyle::Plus,
            MarkerStyle::Star,
        ]
    }
}

/// Which y axis a series is plotted against
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisAssignment {
    #[default]
    Primary,
    Secondary,
}

/// Visual mapping from one dataset column to a plotted element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesStyle {
    pub source_column: String,
    /// Legend label; the column name when absent
    pub label: Option<String>,
    /// Hex color; taken from the theme palette when absent
    pub color: Option<String>,
    pub line_width: f64,
    pub line_style: LineStyle,
    pub marker: MarkerStyle,
    pub marker_size: f64,
    pub alpha: f64,
    pub axis: AxisAssignment,
    pub visible: bool,
}

impl SeriesStyle {
    pub fn new(source_column: impl Into<String>) -> Self {
        Self {
            source_column: source_column.into(),
            label: None,
            color: None,
            line_width: DEFAULT_LINE_WIDTH,
            line_style: LineStyle::default(),
            marker: MarkerStyle::default(),
            marker_size: DEFAULT_MARKER_SIZE,
            alpha: 1.0,
            axis: AxisAssignment::default(),
            visible: true,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_axis(mut self, axis: AxisAssignment) -> Self {
        self.axis = axis;
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.source_column)
    }

    /// Check numeric fields, returning the reason for the first problem
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(format!("alpha must be within [0, 1], got {}", self.alpha));
        }
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(format!("line width must be positive, got {}", self.line_width));
        }
        if !(self.marker_size.is_finite() && self.marker_size > 0.0) {
            return Err(format!("marker size must be positive, got {}", self.marker_size));
        }
        Ok(())
    }
}

// ============================================================================
// Axes
// ============================================================================

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

/// One axis; absent bounds mean auto-range
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub label: String,
    pub scale: AxisScale,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub show_grid: bool,
    #[serde(default)]
    pub invert: bool,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            scale: AxisScale::Linear,
            min: None,
            max: None,
            show_grid: true,
            invert: false,
        }
    }
}

impl AxisConfig {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_scale(mut self, scale: AxisScale) -> Self {
        self.scale = scale;
        self
    }

    /// Check bounds, returning the reason for the first problem
    pub fn validate(&self) -> Result<(), String> {
        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(format!("axis bounds must be finite, got {bound}"));
            }
            if self.scale == AxisScale::Log && bound <= 0.0 {
                return Err(format!("log axis bounds must be positive, got {bound}"));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min >= max {
                return Err(format!("axis min {min} must be less than max {max}"));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisId {
    X,
    YPrimary,
    YSecondary,
}

impl AxisId {
    pub fn label(&self) -> &'static str {
        match self {
            AxisId::X => "X axis",
            AxisId::YPrimary => "Primary Y axis",
            AxisId::YSecondary => "Secondary Y axis",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub x: AxisConfig,
    pub y_primary: AxisConfig,
    pub y_secondary: AxisConfig,
}

impl Axes {
    pub fn get(&self, id: AxisId) -> &AxisConfig {
        match id {
            AxisId::X => &self.x,
            AxisId::YPrimary => &self.y_primary,
            AxisId::YSecondary => &self.y_secondary,
        }
    }

    pub fn get_mut(&mut self, id: AxisId) -> &mut AxisConfig {
        match id {
            AxisId::X => &mut self.x,
            AxisId::YPrimary => &mut self.y_primary,
            AxisId::YSecondary => &mut self.y_secondary,
        }
    }
}

// ============================================================================
// Annotations
// ============================================================================

/// Stable identity of an annotation
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A position along the x axis, which may be numeric, temporal or categorical
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coord {
    Number(f64),
    DateTime(NaiveDateTime),
    Category(String),
}

impl Coord {
    fn is_finite(&self) -> bool {
        match self {
            Coord::Number(n) => n.is_finite(),
            _ => true,
        }
    }
}

impl From<f64> for Coord {
    fn from(value: f64) -> Self {
        Coord::Number(value)
    }
}

impl From<NaiveDateTime> for Coord {
    fn from(value: NaiveDateTime) -> Self {
        Coord::DateTime(value)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coord::Number(n) => write!(f, "{n}"),
            Coord::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Coord::Category(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnnotationKind {
    HorizontalLine {
        y: f64,
        label: String,
        color: String,
        line_style: LineStyle,
    },
    VerticalLine {
        x: Coord,
        label: String,
        color: String,
        line_style: LineStyle,
    },
    /// Shaded x range
    Span {
        x_min: Coord,
        x_max: Coord,
        color: String,
        alpha: f64,
    },
    /// Shaded y range
    Band {
        y_min: f64,
        y_max: f64,
        color: String,
        alpha: f64,
    },
    Text {
        x: Coord,
        y: f64,
        text: String,
        font_size: f64,
        color: String,
    },
    Arrow {
        x: Coord,
        y: f64,
        dx: f64,
        dy: f64,
        text: String,
        color: String,
    },
}

impl AnnotationKind {
    pub fn label(&self) -> &'static str {
        match self {
            AnnotationKind::HorizontalLine { .. } => "Horizontal line",
            AnnotationKind::VerticalLine { .. } => "Vertical line",
            AnnotationKind::Span { .. } => "Span",
            AnnotationKind::Band { .. } => "Band",
            AnnotationKind::Text { .. } => "Text",
            AnnotationKind::Arrow { .. } => "Arrow",
        }
    }

    pub fn color(&self) -> &str {
        match self {
            AnnotationKind::HorizontalLine { color, .. }
            | AnnotationKind::VerticalLine { color, .. }
            | AnnotationKind::Span { color, .. }
            | AnnotationKind::Band { color, .. }
            | AnnotationKind::Text { color, .. }
            | AnnotationKind::Arrow { color, .. } => color,
        }
    }
}

/// An annotation drawn on top of the chart
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub enabled: bool,
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn new(kind: AnnotationKind) -> Self {
        Self {
            id: AnnotationId::new(),
            enabled: true,
            kind,
        }
    }

    pub fn horizontal_line(y: f64) -> Self {
        Self::new(AnnotationKind::HorizontalLine {
            y,
            label: String::new(),
            color: DEFAULT_ANNOTATION_COLOR.to_string(),
            line_style: LineStyle::Dashed,
        })
    }

    pub fn vertical_line(x: impl Into<Coord>) -> Self {
        Self::new(AnnotationKind::VerticalLine {
            x: x.into(),
            label: String::new(),
            color: DEFAULT_ANNOTATION_COLOR.to_string(),
            line_style: LineStyle::Dashed,
        })
    }

    pub fn text(x: impl Into<Coord>, y: f64, text: impl Into<String>) -> Self {
        Self::new(AnnotationKind::Text {
            x: x.into(),
            y,
            text: text.into(),
            font_size: 10.0,
            color: "#000000".to_string(),
        })
    }

    /// Check numeric fields, returning the reason for the first problem
    pub fn validate(&self) -> Result<(), String> {
        let finite = match &self.kind {
            AnnotationKind::HorizontalLine { y, .. } => y.is_finite(),
            AnnotationKind::VerticalLine { x, .. } => x.is_finite(),
            AnnotationKind::Span { x_min, x_max, .. } => x_min.is_finite() && x_max.is_finite(),
            AnnotationKind::Band { y_min, y_max, .. } => y_min.is_finite() && y_max.is_finite(),
            AnnotationKind::Text { x, y, font_size, .. } => {
                x.is_finite() && y.is_finite() && font_size.is_finite()
            }
            AnnotationKind::Arrow { x, y, dx, dy, .. } => {
                x.is_finite() && y.is_finite() && dx.is_finite() && dy.is_finite()
            }
        };
        if !finite {
            return Err(format!("{} has a non-finite position", self.kind.label()));
        }
        match &self.kind {
            AnnotationKind::Span { alpha, .. } | AnnotationKind::Band { alpha, .. }
                if !(0.0..=1.0).contains(alpha) =>
            {
                Err(format!("alpha must be within [0, 1], got {alpha}"))
            }
            AnnotationKind::Band { y_min, y_max, .. } if y_min > y_max => {
                Err(format!("band y_min {y_min} exceeds y_max {y_max}"))
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Theme, Legend, Figure
// ============================================================================

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub mode: ThemeMode,
    pub font_family: String,
    pub font_size: f64,
    pub title_font_size: f64,
    pub palette: Vec<String>,
    pub background_color: String,
    pub grid_color: String,
    pub text_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    pub fn light() -> Self {
        Self {
            name: "default".to_string(),
            mode: ThemeMode::Light,
            font_family: "sans-serif".to_string(),
            font_size: 11.0,
            title_font_size: 14.0,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            background_color: "#ffffff".to_string(),
            grid_color: "#e0e0e0".to_string(),
            text_color: "#000000".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            mode: ThemeMode::Dark,
            palette: DARK_PALETTE.iter().map(|c| c.to_string()).collect(),
            background_color: "#1e1e1e".to_string(),
            grid_color: "#3a3a3a".to_string(),
            text_color: "#e0e0e0".to_string(),
            ..Self::light()
        }
    }

    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
        }
    }

    /// Palette color for the series at `index`, cycling through the palette
    pub fn color_for(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            return DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()];
        }
        &self.palette[index % self.palette.len()]
    }

    /// Check numeric fields, returning the reason for the first problem
    pub fn validate(&self) -> Result<(), String> {
        for size in [self.font_size, self.title_font_size] {
            if !(size.is_finite() && size > 0.0) {
                return Err(format!("font sizes must be positive, got {size}"));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    #[default]
    Best,
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
    Right,
    Center,
}

impl LegendPosition {
    pub fn label(&self) -> &'static str {
        match self {
            LegendPosition::Best => "Best",
            LegendPosition::UpperRight => "Upper right",
            LegendPosition::UpperLeft => "Upper left",
            LegendPosition::LowerLeft => "Lower left",
            LegendPosition::LowerRight => "Lower right",
            LegendPosition::Right => "Right",
            LegendPosition::Center => "Center",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendConfig {
    pub show: bool,
    pub position: LegendPosition,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            show: true,
            position: LegendPosition::Best,
        }
    }
}

/// Output figure size in inches plus resolution
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FigureSize {
    pub width: f64,
    pub height: f64,
    pub dpi: u32,
}

impl Default for FigureSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_FIGURE_SIZE.0,
            height: DEFAULT_FIGURE_SIZE.1,
            dpi: DEFAULT_DPI,
        }
    }
}

impl FigureSize {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.width.is_finite() && self.width > 0.0 && self.height.is_finite() && self.height > 0.0) {
            return Err(format!(
                "figure size must be positive, got {}x{}",
                self.width, self.height
            ));
        }
        if self.dpi == 0 {
            return Err("figure dpi must be positive".to_string());
        }
        Ok(())
    }

    pub fn pixels(&self) -> (u32, u32) {
        let dpi = f64::from(self.dpi);
        ((self.width * dpi).round() as u32, (self.height * dpi).round() as u32)
    }
}

// ============================================================================
// Chart Configuration
// ============================================================================

/// Everything about a chart except its data and theme
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub title: String,
    pub subtitle: String,
    /// Column plotted along x; row position when absent
    pub x_column: Option<String>,
    pub series: Vec<SeriesStyle>,
    pub axes: Axes,
    pub annotations: Vec<Annotation>,
    pub legend: LegendConfig,
    pub figure: FigureSize,
}

impl ChartConfig {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_x_column(mut self, column: impl Into<String>) -> Self {
        self.x_column = Some(column.into());
        self
    }

    pub fn with_series(mut self, series: SeriesStyle) -> Self {
        self.series.push(series);
        self
    }

    pub fn series_for(&self, column: &str) -> Option<&SeriesStyle> {
        self.series.iter().find(|s| s.source_column == column)
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Whether any visible series uses the secondary y axis
    pub fn uses_secondary_axis(&self) -> bool {
        self.series
            .iter()
            .any(|s| s.visible && s.axis == AxisAssignment::Secondary)
    }
}
