//! Application-wide constants.
//!
//! Centralizes magic numbers and default values to make the codebase
//! more maintainable and self-documenting.

// ============================================================================
// History
// ============================================================================

/// Maximum undo history states to keep
pub const MAX_HISTORY_STATES: usize = 50;

// ============================================================================
// Dataset Defaults
// ============================================================================

/// Base name for columns added without an explicit name
pub const NEW_COLUMN_BASE_NAME: &str = "NewColumn";

/// Default dataset name when none can be derived from a source
pub const DEFAULT_DATASET_NAME: &str = "Data";

// ============================================================================
// Import Limits
// ============================================================================

/// Maximum CSV file size in megabytes for eager loading
pub const MAX_CSV_SIZE_MB: usize = 100;

/// Maximum number of rows for eager loading
pub const MAX_CSV_ROWS: usize = 100_000;

// ============================================================================
// Series Defaults
// ============================================================================

/// Maximum number of series created automatically from a new dataset
pub const AUTO_SERIES_LIMIT: usize = 10;

/// Default line width for new series
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// Default marker size for new series
pub const DEFAULT_MARKER_SIZE: f64 = 6.0;

/// Default figure size in inches (width, height)
pub const DEFAULT_FIGURE_SIZE: (f64, f64) = (10.0, 6.0);

/// Default figure resolution
pub const DEFAULT_DPI: u32 = 100;

// ============================================================================
// Expressions
// ============================================================================

/// Longest accepted Filter/ComputedColumn expression, in characters
pub const MAX_EXPRESSION_LEN: usize = 4096;

/// Deepest accepted expression nesting
pub const MAX_EXPRESSION_DEPTH: usize = 64;

// ============================================================================
// Transforms
// ============================================================================

/// Most output periods a single Resample may produce
pub const MAX_RESAMPLE_PERIODS: usize = 100_000;

// ============================================================================
// Timing
// ============================================================================

/// Pipeline or render calls slower than this are logged as warnings
pub const SLOW_OPERATION_MS: f64 = 250.0;

// ============================================================================
// Colors (default hex values)
// ============================================================================

/// Default chart palette (light theme)
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
    "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

/// Chart palette tuned for dark backgrounds
pub const DARK_PALETTE: [&str; 8] = [
    "#4c9be8", "#5fd068", "#f5a142", "#b47cf0",
    "#ef5b5b", "#3cc6c0", "#f2d64b", "#e86fb8",
];

/// Default annotation color
pub const DEFAULT_ANNOTATION_COLOR: &str = "#d62728";
