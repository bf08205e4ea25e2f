//! Column rename/delete propagation through AppState

use crate::helpers::{column, ints, sample_project, TestProjectBuilder};
use graphsmith::app::{AppState, StateError};
use graphsmith::data::{ColumnType, DataCell};
use graphsmith::transform::{
    Aggregation, InterpolateMethod, MathOp, NormalizeMethod, ResampleRule, SmoothMethod,
    TransformKind,
};
use graphsmith::types::{AxisAssignment, LineStyle, SeriesStyle};
use std::sync::{Arc, Mutex};

#[test]
fn test_rename_updates_series_and_keeps_style() {
    let mut project = sample_project();
    project.chart.series[0] = SeriesStyle::new("A")
        .with_label("Alpha line")
        .with_color("#123456")
        .with_axis(AxisAssignment::Secondary);
    project.chart.series[0].line_style = LineStyle::Dotted;
    let original = project.chart.series[0].clone();
    let mut state = AppState::new(project);

    state.rename_column("A", "Y").unwrap();
    let renamed = &state.project().chart.series[0];
    assert_eq!(renamed.source_column, "Y");
    assert_eq!(
        renamed,
        &SeriesStyle {
            source_column: "Y".into(),
            ..original
        }
    );
    assert_eq!(state.project().chart.series[1].source_column, "B");
}

#[test]
fn test_rename_updates_x_column_and_pipeline() {
    let project = TestProjectBuilder::new()
        .with_column("T", ints(&[Some(1), Some(2), Some(3)]))
        .with_column("A", ints(&[Some(1), None, Some(3)]))
        .with_column("B", ints(&[Some(5), Some(6), Some(7)]))
        .with_x_column("T")
        .with_series("Sum")
        .with_transform(TransformKind::Interpolate {
            method: InterpolateMethod::Linear,
            columns: vec!["A".into()],
        })
        .with_transform(TransformKind::ColumnMath {
            op: MathOp::Add,
            left: "A".into(),
            right: "B".into(),
            result_name: "Sum".into(),
        })
        .with_transform(TransformKind::Filter {
            expression: "T >= 2 and A > 1".into(),
        })
        .build();
    let mut state = AppState::new(project);
    let before = state.transformed().dataset.clone();

    state.rename_column("T", "Time").unwrap();
    state.rename_column("A", "Amount Sold").unwrap();

    let project = state.project();
    assert_eq!(project.chart.x_column.as_deref(), Some("Time"));
    assert_eq!(
        project.transforms[2].kind,
        TransformKind::Filter {
            expression: "Time >= 2 and `Amount Sold` > 1".into()
        }
    );
    assert_eq!(
        project.transforms[0].kind,
        TransformKind::Interpolate {
            method: InterpolateMethod::Linear,
            columns: vec!["Amount Sold".into()],
        }
    );

    // The pipeline output differs only by column names
    let after = state.transformed();
    assert!(!after.has_warnings(), "{:?}", after.warnings);
    assert_eq!(after.dataset.rows(), before.rows());
    assert_eq!(
        after.dataset.column_names().collect::<Vec<_>>(),
        vec!["Time", "Amount Sold", "B", "Sum"]
    );
}

#[test]
fn test_rename_is_observed_atomically() {
    let mut state = AppState::new(sample_project());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = state.subscribe(move |project| {
        let consistent = project.dataset.has_column("Renamed")
            && project.chart.series_for("A").is_none()
            && project.chart.series_for("Renamed").is_some();
        sink.lock().unwrap().push(consistent);
    });

    state.rename_column("A", "Renamed").unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![true]);
}

#[test]
fn test_failed_rename_changes_nothing() {
    let mut state = AppState::new(sample_project());
    let before = state.project().clone();

    let err = state.rename_column("A", "B").unwrap_err();
    assert!(err.is_invalid_name());
    let err = state.rename_column("A", "").unwrap_err();
    assert!(err.is_invalid_name());
    assert!(matches!(
        state.rename_column("Missing", "Z"),
        Err(StateError::Data(graphsmith::DataError::ColumnNotFound(_)))
    ));

    assert_eq!(state.project(), &before);
    assert!(!state.can_undo());
}

#[test]
fn test_delete_removes_only_matching_series() {
    let mut project = sample_project();
    project.chart.series.push(SeriesStyle::new("A").with_label("duplicate"));
    let untouched = project.chart.series[1].clone();
    let mut state = AppState::new(project);

    state.delete_column("A").unwrap();
    let series = &state.project().chart.series;
    assert_eq!(series.len(), 1);
    assert_eq!(series[0], untouched);
    assert_eq!(state.project().chart.x_column.as_deref(), Some("X"));

    state.delete_column("X").unwrap();
    assert_eq!(state.project().chart.x_column, None);

    state.undo().unwrap();
    state.undo().unwrap();
    assert_eq!(state.project().chart.series.len(), 3);
}

#[test]
fn test_delete_column_leaves_transforms_to_warn() {
    let project = TestProjectBuilder::new()
        .with_column("A", ints(&[Some(1)]))
        .with_column("B", ints(&[Some(2)]))
        .with_transform(TransformKind::Diff {
            column: "B".into(),
            periods: 1,
        })
        .build();
    let mut state = AppState::new(project);

    state.delete_column("B").unwrap();
    assert_eq!(state.project().transforms.len(), 1);
    assert_eq!(state.transformed().warnings.len(), 1);
    assert_eq!(state.transformed().dataset.column_names().collect::<Vec<_>>(), vec!["A"]);
}

#[test]
fn test_rename_onto_pipeline_column_is_rejected() {
    let project = TestProjectBuilder::new()
        .with_column("A", ints(&[Some(1)]))
        .with_column("B", ints(&[Some(10)]))
        .with_series("Total")
        .with_transform(TransformKind::ComputedColumn {
            result_name: "Total".into(),
            expression: "A + B".into(),
        })
        .with_transform(TransformKind::ColumnMath {
            op: MathOp::Mul,
            left: "A".into(),
            right: "B".into(),
            result_name: "Product".into(),
        })
        .build();
    let mut state = AppState::new(project);
    let product = state.project().transforms[1].id;
    state.set_transform_enabled(product, false).unwrap();
    let before = state.project().clone();
    let output = state.transformed().clone();
    assert_eq!(column(&output.dataset, "Total"), ints(&[Some(11)]));

    // Produced by an enabled transform
    assert!(state.rename_column("A", "Total").unwrap_err().is_invalid_name());
    // Written by a disabled transform
    assert!(state.rename_column("B", "Product").unwrap_err().is_invalid_name());
    // Not expressible in expression text
    assert!(state.rename_column("A", "a`b").unwrap_err().is_invalid_name());

    assert_eq!(state.project(), &before);
    assert_eq!(state.transformed(), &output);
    assert_eq!(state.undo_len(), 1);
}

#[test]
fn test_pipeline_output_is_invariant_under_rename() {
    let days = ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"];
    let when: Vec<DataCell> = days
        .iter()
        .map(|d| DataCell::parse_typed(d, ColumnType::DateTime))
        .collect();
    let renames = [("When", "Date Stamp"), ("A", "Amount Sold"), ("B", "Base")];

    let cases = vec![
        TransformKind::ColumnMath {
            op: MathOp::Add,
            left: "A".into(),
            right: "B".into(),
            result_name: "Sum".into(),
        },
        TransformKind::Normalize {
            method: NormalizeMethod::ZScore,
            column: "A".into(),
        },
        TransformKind::Smooth {
            method: SmoothMethod::RollingMean,
            column: "A".into(),
            window: 2,
            alpha: None,
            partial_window: true,
        },
        TransformKind::Resample {
            date_column: "When".into(),
            rule: ResampleRule::Daily,
            aggregation: Aggregation::Sum,
        },
        TransformKind::Interpolate {
            method: InterpolateMethod::Linear,
            columns: vec!["A".into()],
        },
        TransformKind::Diff {
            column: "A".into(),
            periods: 1,
        },
        TransformKind::PctChange {
            column: "B".into(),
            periods: 1,
        },
        TransformKind::Filter {
            expression: "A > 1 or B == 10".into(),
        },
        TransformKind::Group {
            by: vec!["B".into()],
            aggregation: Aggregation::Sum,
        },
        TransformKind::ComputedColumn {
            result_name: "Total".into(),
            expression: "A * 2 + B".into(),
        },
    ];

    for kind in cases {
        let label = kind.label();
        let project = TestProjectBuilder::new()
            .with_column("When", when.clone())
            .with_column("A", ints(&[Some(1), None, Some(3), Some(4)]))
            .with_column("B", ints(&[Some(10), Some(20), Some(30), Some(40)]))
            .with_x_column("When")
            .with_transform(kind)
            .build();
        let mut state = AppState::new(project);
        let before = state.transformed().clone();
        assert!(!before.has_warnings(), "{label}: {:?}", before.warnings);

        for (old, new) in renames {
            state.rename_column(old, new).unwrap();
        }

        let after = state.transformed();
        assert!(!after.has_warnings(), "{label}: {:?}", after.warnings);
        assert_eq!(after.dataset.rows(), before.dataset.rows(), "{label}");
        let expected: Vec<&str> = before
            .dataset
            .column_names()
            .map(|name| {
                renames
                    .iter()
                    .find(|(old, _)| *old == name)
                    .map_or(name, |(_, new)| *new)
            })
            .collect();
        assert_eq!(after.dataset.column_names().collect::<Vec<_>>(), expected, "{label}");
        let types = |output: &graphsmith::transform::PipelineOutput| {
            output.dataset.columns().iter().map(|c| c.column_type).collect::<Vec<_>>()
        };
        assert_eq!(types(after), types(&before), "{label}");
    }
}
