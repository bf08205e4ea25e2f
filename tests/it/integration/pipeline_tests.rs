//! Pipeline integration tests: ordering, skipping and the worked scenarios
//! for the transform engine.

use crate::helpers::{assert_column, column, dataset, division_dataset, floats, ints, texts};
use graphsmith::app::AppState;
use graphsmith::data::{ColumnType, DataCell};
use graphsmith::project::ProjectState;
use graphsmith::transform::{
    apply, Aggregation, ExpressionError, MathOp, NormalizeMethod, ResampleRule, SmoothMethod,
    Transform, TransformError, TransformKind,
};

fn math(op: MathOp, left: &str, right: &str, result: &str) -> TransformKind {
    TransformKind::ColumnMath {
        op,
        left: left.into(),
        right: right.into(),
        result_name: result.into(),
    }
}

fn normalize(column: &str) -> TransformKind {
    TransformKind::Normalize {
        method: NormalizeMethod::MinMax,
        column: column.into(),
    }
}

// ============================================================================
// Worked scenarios
// ============================================================================

#[test]
fn test_division_by_zero_yields_null() {
    let out = apply(
        &division_dataset(),
        &[Transform::new(math(MathOp::Div, "A", "B", "C"))],
    );
    assert!(!out.has_warnings());
    assert_eq!(out.applied, 1);
    assert_column(&out.dataset, "C", floats(&[Some(2.0), None]));
}

#[test]
fn test_constant_column_normalizes_to_zero() {
    let ds = dataset(vec![("A", ints(&[Some(5), Some(5), Some(5)]))]);
    let out = apply(&ds, &[Transform::new(normalize("A"))]);
    assert!(!out.has_warnings());
    assert_column(&out.dataset, "A", floats(&[Some(0.0), Some(0.0), Some(0.0)]));
}

#[test]
fn test_blank_project_has_no_series() {
    let project = ProjectState::blank();
    assert_eq!(
        project.dataset.column_names().collect::<Vec<_>>(),
        vec!["X", "Y"]
    );
    assert!(project.chart.series.is_empty());

    // Importing the blank dataset keeps the chart empty as well
    let mut state = AppState::new(project);
    state.import_dataset(graphsmith::TabularDataset::blank()).unwrap();
    assert!(state.project().chart.series.is_empty());
}

#[test]
fn test_malicious_expression_is_skipped() {
    let ds = division_dataset();
    let bad = Transform::new(TransformKind::ComputedColumn {
        result_name: "C".into(),
        expression: "__import__('os').system('rm -rf /')".into(),
    });
    let bad_id = bad.id;
    let out = apply(&ds, &[bad, Transform::new(math(MathOp::Add, "A", "B", "D"))]);

    assert_eq!(out.warnings.len(), 1);
    let warning = out.warning_for(bad_id).unwrap();
    assert!(matches!(
        warning.error,
        TransformError::Expression(ExpressionError::DisallowedFunction(_))
    ));
    assert!(!out.dataset.has_column("C"));
    assert_column(&out.dataset, "A", ints(&[Some(4), Some(2)]));
    assert_column(&out.dataset, "B", ints(&[Some(2), Some(0)]));
    assert_column(&out.dataset, "D", ints(&[Some(6), Some(2)]));
}

// ============================================================================
// Ordering and toggling
// ============================================================================

#[test]
fn test_order_sensitivity() {
    let ds = dataset(vec![
        ("A", ints(&[Some(1), Some(3)])),
        ("B", ints(&[Some(10), Some(20)])),
    ]);
    let normalize_first = apply(
        &ds,
        &[
            Transform::new(normalize("A")),
            Transform::new(math(MathOp::Add, "A", "B", "C")),
        ],
    );
    let math_first = apply(
        &ds,
        &[
            Transform::new(math(MathOp::Add, "A", "B", "C")),
            Transform::new(normalize("A")),
        ],
    );
    assert_column(&normalize_first.dataset, "C", floats(&[Some(10.0), Some(21.0)]));
    assert_column(&math_first.dataset, "C", ints(&[Some(11), Some(23)]));
    assert_ne!(column(&normalize_first.dataset, "C"), column(&math_first.dataset, "C"));
}

#[test]
fn test_disable_then_enable_reproduces_output() {
    let ds = dataset(vec![
        ("A", ints(&[Some(1), Some(4), Some(9), Some(16)])),
        ("B", ints(&[Some(2), Some(2), Some(2), Some(2)])),
    ]);
    let mut state = AppState::new(ProjectState::from_dataset_with_limit(ds, 0));
    state.add_transform(math(MathOp::Mul, "A", "B", "C")).unwrap();
    let smooth = state
        .add_transform(TransformKind::Smooth {
            method: SmoothMethod::RollingMean,
            column: "C".into(),
            window: 2,
            alpha: None,
            partial_window: false,
        })
        .unwrap();
    state.add_transform(normalize("C")).unwrap();
    let original = state.transformed().dataset.clone();

    state.set_transform_enabled(smooth, false).unwrap();
    assert_eq!(state.transformed().skipped_disabled, 1);
    assert_ne!(state.transformed().dataset, original);
    assert_eq!(state.project().transforms[1].id, smooth);

    state.set_transform_enabled(smooth, true).unwrap();
    assert_eq!(state.transformed().dataset, original);
}

#[test]
fn test_failed_step_passes_previous_dataset_on() {
    let ds = dataset(vec![
        ("Name", texts(&["a", "b", "c"])),
        ("V", ints(&[Some(1), Some(2), Some(3)])),
    ]);
    let out = apply(
        &ds,
        &[
            Transform::new(normalize("Name")),
            Transform::new(TransformKind::Filter {
                expression: "V >".into(),
            }),
            Transform::new(TransformKind::Filter {
                expression: "V >= 2".into(),
            }),
        ],
    );
    assert_eq!(out.warnings.len(), 2);
    assert!(matches!(out.warnings[0].error, TransformError::TypeMismatch { .. }));
    assert!(matches!(out.warnings[1].error, TransformError::Expression(_)));
    assert_eq!(out.applied, 1);
    assert_column(&out.dataset, "Name", texts(&["b", "c"]));
}

// ============================================================================
// Longer pipelines
// ============================================================================

#[test]
fn test_resample_then_diff() {
    let days = ["2024-01-05", "2024-01-20", "2024-02-10", "2024-03-01", "2024-03-15"];
    let ds = dataset(vec![
        (
            "Date",
            days.iter()
                .map(|d| DataCell::parse_typed(d, ColumnType::DateTime))
                .collect(),
        ),
        ("Sales", ints(&[Some(10), Some(5), Some(7), Some(1), Some(2)])),
    ]);
    assert_eq!(ds.column("Date").unwrap().column_type, ColumnType::DateTime);

    let out = apply(
        &ds,
        &[
            Transform::new(TransformKind::Resample {
                date_column: "Date".into(),
                rule: ResampleRule::Monthly,
                aggregation: Aggregation::Sum,
            }),
            Transform::new(TransformKind::Diff {
                column: "Sales".into(),
                periods: 1,
            }),
        ],
    );
    assert!(!out.has_warnings(), "{:?}", out.warnings);
    assert_eq!(out.dataset.row_count(), 3);
    assert_column(&out.dataset, "Sales", ints(&[None, Some(-8), Some(-4)]));
}

#[test]
fn test_group_then_computed_column() {
    let ds = dataset(vec![
        ("Region", texts(&["N", "S", "N", "S", "E"])),
        ("Units", ints(&[Some(1), Some(2), Some(3), Some(4), Some(5)])),
    ]);
    let out = apply(
        &ds,
        &[
            Transform::new(TransformKind::Group {
                by: vec!["Region".into()],
                aggregation: Aggregation::Sum,
            }),
            Transform::new(TransformKind::ComputedColumn {
                result_name: "Share".into(),
                expression: "round(Units / 15 * 100, 1)".into(),
            }),
        ],
    );
    assert!(!out.has_warnings(), "{:?}", out.warnings);
    assert_column(&out.dataset, "Region", texts(&["N", "S", "E"]));
    assert_column(&out.dataset, "Units", ints(&[Some(4), Some(6), Some(5)]));
    assert_column(&out.dataset, "Share", floats(&[Some(26.7), Some(40.0), Some(33.3)]));
}

#[test]
fn test_dangling_series_after_group() {
    let ds = dataset(vec![
        ("Region", texts(&["N", "S"])),
        ("Units", ints(&[Some(1), Some(2)])),
        ("Notes", texts(&["x", "y"])),
    ]);
    let mut project = ProjectState::from_dataset(ds);
    project.chart.series.push(graphsmith::types::SeriesStyle::new("Notes"));
    let mut state = AppState::new(project);

    state
        .add_transform(TransformKind::Group {
            by: vec!["Region".into()],
            aggregation: Aggregation::Sum,
        })
        .unwrap();
    assert!(state.dangling_series().is_empty());

    state.delete_column("Notes").unwrap();
    assert!(state.dangling_series().is_empty());
    assert!(state.project().chart.series_for("Notes").is_none());

    state
        .add_transform(TransformKind::Filter {
            expression: "Units > 0".into(),
        })
        .unwrap();
    state.rename_column("Units", "Count").unwrap();
    assert_eq!(state.transformed().warnings.len(), 0);
    assert_eq!(state.prune_dangling_series().unwrap(), 0);
}
