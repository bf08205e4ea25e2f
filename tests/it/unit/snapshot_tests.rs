//! Snapshot tests using the insta crate.
//!
//! These pin the persisted JSON shape of project building blocks. A change
//! here is a project file format change.
//!
//! To update snapshots after intentional changes:
//! ```sh
//! cargo insta test --accept
//! ```

use chrono::NaiveDate;
use graphsmith::transform::{Aggregation, SmoothMethod, TransformKind};
use graphsmith::types::{AnnotationKind, Coord, LineStyle, SeriesStyle};

fn pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap()
}

// ============================================================================
// Transform kinds
// ============================================================================

#[test]
fn snapshot_smooth_transform() {
    let kind = TransformKind::Smooth {
        method: SmoothMethod::RollingMean,
        column: "Sales".to_string(),
        window: 3,
        alpha: None,
        partial_window: false,
    };
    insta::assert_json_snapshot!(kind, @r#"
    {
      "kind": "smooth",
      "method": "rolling_mean",
      "column": "Sales",
      "window": 3,
      "alpha": null,
      "partial_window": false
    }
    "#);
}

#[test]
fn snapshot_group_transform() {
    let kind = TransformKind::Group {
        by: vec!["Region".to_string(), "Year".to_string()],
        aggregation: Aggregation::Mean,
    };
    insta::assert_json_snapshot!(kind, @r#"
    {
      "kind": "group",
      "by": [
        "Region",
        "Year"
      ],
      "aggregation": "mean"
    }
    "#);
}

// ============================================================================
// Chart building blocks
// ============================================================================

#[test]
fn snapshot_series_style() {
    let style = SeriesStyle::new("Sales").with_color("#1f77b4");
    insta::assert_snapshot!(pretty(&style), @r##"
    {
      "source_column": "Sales",
      "label": null,
      "color": "#1f77b4",
      "line_width": 2.0,
      "line_style": "solid",
      "marker": "none",
      "marker_size": 6.0,
      "alpha": 1.0,
      "axis": "primary",
      "visible": true
    }
    "##);
}

#[test]
fn snapshot_band_annotation() {
    let kind = AnnotationKind::Band {
        y_min: 0.5,
        y_max: 2.5,
        color: "#ff0000".to_string(),
        alpha: 0.25,
    };
    insta::assert_snapshot!(pretty(&kind), @r##"
    {
      "type": "band",
      "y_min": 0.5,
      "y_max": 2.5,
      "color": "#ff0000",
      "alpha": 0.25
    }
    "##);
}

#[test]
fn snapshot_vertical_line_at_date() {
    let at = NaiveDate::from_ymd_opt(2024, 1, 31)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let kind = AnnotationKind::VerticalLine {
        x: Coord::DateTime(at),
        label: "Launch".to_string(),
        color: "#333333".to_string(),
        line_style: LineStyle::DashDot,
    };
    insta::assert_json_snapshot!(kind, @r##"
    {
      "type": "vertical_line",
      "x": {
        "date_time": "2024-01-31T00:00:00"
      },
      "label": "Launch",
      "color": "#333333",
      "line_style": "dash_dot"
    }
    "##);
}
