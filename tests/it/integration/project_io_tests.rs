//! Project save/load integration tests

use crate::helpers::{floats, ints, sample_project, texts, TestProjectBuilder};
use chrono::NaiveDate;
use graphsmith::app::AppState;
use graphsmith::data::{ColumnType, DataCell};
use graphsmith::project::ProjectState;
use graphsmith::project_io::{
    deserialize, load_from_file, save_to_file, serialize, ProjectIoError, CURRENT_SCHEMA_VERSION,
    FORMAT_MARKER,
};
use graphsmith::transform::{Aggregation, ResampleRule, SmoothMethod, Transform, TransformKind};
use graphsmith::types::{
    Annotation, AnnotationKind, AxisAssignment, AxisConfig, AxisScale, ChartKind, Coord,
    LegendPosition, SeriesStyle, Theme,
};
use std::fs;
use tempfile::tempdir;

/// A project touching every persisted field
fn rich_project() -> ProjectState {
    let day = |d: u32| {
        DataCell::DateTime(
            NaiveDate::from_ymd_opt(2024, 3, d)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap(),
        )
    };
    let mut project = TestProjectBuilder::new()
        .with_column("When", vec![day(1), day(2), DataCell::Empty])
        .with_column("Ratio", floats(&[Some(0.1), Some(1e-300), Some(-2.5)]))
        .with_column("Count", ints(&[Some(i64::MAX), None, Some(-7)]))
        .with_column("Flag", vec![DataCell::Boolean(true), DataCell::Boolean(false), DataCell::Empty])
        .with_column("Label", texts(&["a \"quoted\" value", "", "ünïcödé"]))
        .with_x_column("When")
        .with_transform(TransformKind::Smooth {
            method: SmoothMethod::Ewm,
            column: "Ratio".into(),
            window: 3,
            alpha: Some(0.3),
            partial_window: true,
        })
        .with_transform(TransformKind::Resample {
            date_column: "When".into(),
            rule: ResampleRule::Weekly,
            aggregation: Aggregation::Median,
        })
        .build();

    project.transforms.push(
        Transform::new(TransformKind::ComputedColumn {
            result_name: "Scaled".into(),
            expression: "Ratio * 2".into(),
        })
        .disabled(),
    );
    project.chart.kind = ChartKind::StackedBar;
    project.chart.title = "Title".into();
    project.chart.subtitle = "Sub".into();
    project.chart.series = vec![
        SeriesStyle::new("Ratio").with_color("#abcdef"),
        SeriesStyle::new("Count")
            .with_label("Counted")
            .with_axis(AxisAssignment::Secondary),
    ];
    project.chart.axes.y_primary = AxisConfig::default()
        .with_label("Ratio")
        .with_scale(AxisScale::Log)
        .with_range(Some(0.01), Some(100.0));
    project.chart.legend.position = LegendPosition::LowerLeft;
    project.chart.figure.dpi = 150;
    project.chart.annotations = vec![
        Annotation::horizontal_line(0.5),
        Annotation::vertical_line(Coord::Category("Q1".into())),
        Annotation::text(1.5, 2.0, "note"),
        Annotation::new(AnnotationKind::Span {
            x_min: Coord::DateTime(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()),
            x_max: Coord::DateTime(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(0, 0, 0).unwrap()),
            color: "#00ff00".into(),
            alpha: 0.2,
        }),
        Annotation::new(AnnotationKind::Arrow {
            x: Coord::Number(1.0),
            y: 2.0,
            dx: 0.5,
            dy: -0.25,
            text: "peak".into(),
            color: "#000000".into(),
        }),
    ];
    project.chart.annotations[1].enabled = false;
    project.theme = Theme::dark();
    project
}

#[test]
fn test_round_trip_is_lossless() {
    let project = rich_project();
    let text = serialize(&project).unwrap();
    let loaded = deserialize(&text).unwrap();
    assert_eq!(loaded, project);
    assert_eq!(loaded.dataset.column("Flag").unwrap().column_type, ColumnType::Boolean);
    assert_eq!(loaded.dataset.cell(1, "Ratio"), Some(&DataCell::Float(1e-300)));
}

#[test]
fn test_save_and_load_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("chart.graphsmith.json");
    let project = rich_project();

    save_to_file(&project, &path).unwrap();
    assert_eq!(load_from_file(&path).unwrap(), project);

    // Overwriting leaves exactly one file behind
    save_to_file(&sample_project(), &path).unwrap();
    assert_eq!(load_from_file(&path).unwrap(), sample_project());
    let entries = fs::read_dir(path.parent().unwrap()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = load_from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ProjectIoError::Io { operation: "read", .. }));
}

#[test]
fn test_failed_load_leaves_state_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, r#"{"format": "graphsmith-project", "schema_version": 1, "project": {"dataset": 5}}"#)
        .unwrap();

    let mut state = AppState::new(sample_project());
    state.set_title("live").unwrap();
    let before = state.project().clone();

    match load_from_file(&path) {
        Ok(project) => state.replace_project(project),
        Err(err) => assert!(matches!(err, ProjectIoError::Json(_)), "{err}"),
    }
    assert_eq!(state.project(), &before);
    assert!(state.can_undo());
}

#[test]
fn test_invalid_dataset_rejected_on_load() {
    let mut value: serde_json::Value = serde_json::from_str(&serialize(&sample_project()).unwrap()).unwrap();
    value["project"]["dataset"]["columns"][1]["name"] = "X".into();
    assert!(matches!(
        deserialize(&value.to_string()),
        Err(ProjectIoError::Json(_))
    ));
}

#[test]
fn test_schema_markers() {
    let text = serialize(&sample_project()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["format"], FORMAT_MARKER);
    assert_eq!(value["schema_version"], CURRENT_SCHEMA_VERSION);

    let mut old = value.clone();
    old["schema_version"] = 0.into();
    assert!(matches!(
        deserialize(&old.to_string()),
        Err(ProjectIoError::SchemaVersion { found: 0, .. })
    ));

    let mut newer = value;
    newer["schema_version"] = (CURRENT_SCHEMA_VERSION + 1).into();
    assert!(matches!(
        deserialize(&newer.to_string()),
        Err(ProjectIoError::SchemaVersion { .. })
    ));
}
