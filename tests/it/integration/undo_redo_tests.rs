//! Undo/Redo Integration Tests

use crate::helpers::{division_dataset, floats, ints, sample_project, TestProjectBuilder};
use graphsmith::app::{AppState, StateError};
use graphsmith::data::{ColumnType, DataCell};
use graphsmith::settings::Settings;
use graphsmith::transform::{MathOp, NormalizeMethod, TransformKind};
use graphsmith::types::{
    Annotation, AxisConfig, AxisId, AxisScale, ChartKind, SeriesStyle, Theme,
};

type Mutation = Box<dyn Fn(&mut AppState) -> Result<(), StateError>>;

fn mutation(f: impl Fn(&mut AppState) -> Result<(), StateError> + 'static) -> Mutation {
    Box::new(f)
}

#[test]
fn test_undo_restores_previous_project_and_redo_reapplies() {
    let mut state = AppState::new(sample_project());
    let before = state.project().clone();

    state.set_title("Quarterly").unwrap();
    let after = state.project().clone();
    assert_ne!(before, after);

    state.undo().unwrap();
    assert_eq!(state.project(), &before);
    state.redo().unwrap();
    assert_eq!(state.project(), &after);
}

#[test]
fn test_undo_inverse_across_mutation_kinds() {
    let mut state = AppState::new(sample_project());
    let id = state
        .add_transform(TransformKind::Normalize {
            method: NormalizeMethod::MinMax,
            column: "A".into(),
        })
        .unwrap();
    let annotation = state.add_annotation(Annotation::horizontal_line(2.0)).unwrap();

    let mutations = vec![
        mutation(|s| s.insert_row(1)),
        mutation(|s| s.delete_row(0)),
        mutation(|s| s.add_column(ColumnType::Float).map(|_| ())),
        mutation(|s| s.set_cell(0, "A", "99")),
        mutation(|s| s.rename_column("A", "Alpha")),
        mutation(|s| s.delete_column("B")),
        mutation(move |s| s.set_transform_enabled(id, false)),
        mutation(move |s| s.remove_transform(id)),
        mutation(|s| s.set_chart_kind(ChartKind::Scatter)),
        mutation(|s| s.set_series_style(SeriesStyle::new("A").with_color("#ff0000"))),
        mutation(|s| s.remove_series("B")),
        mutation(|s| s.set_axis(AxisId::YPrimary, AxisConfig::default().with_label("Units"))),
        mutation(move |s| s.set_annotation_enabled(annotation, false)),
        mutation(move |s| s.remove_annotation(annotation)),
        mutation(|s| s.set_theme(Theme::dark())),
    ];

    for (i, mutate) in mutations.iter().enumerate() {
        let before = state.project().clone();
        let before_output = state.transformed().clone();
        mutate(&mut state).unwrap_or_else(|e| panic!("mutation {i} failed: {e}"));
        let after = state.project().clone();

        state.undo().unwrap();
        assert_eq!(state.project(), &before, "mutation {i} undo");
        assert_eq!(state.transformed(), &before_output, "mutation {i} pipeline");
        state.redo().unwrap();
        assert_eq!(state.project(), &after, "mutation {i} redo");
        state.undo().unwrap();
    }
}

#[test]
fn test_history_is_bounded() {
    let mut state = AppState::new(sample_project());
    for i in 0..100 {
        state.set_title(format!("Title {i}")).unwrap();
    }
    assert_eq!(state.undo_len(), 50);

    let mut undone = 0;
    while state.undo().is_ok() {
        undone += 1;
    }
    assert_eq!(undone, 50);
    // The oldest surviving snapshot is the state after mutation 49
    assert_eq!(state.project().chart.title, "Title 49");
}

#[test]
fn test_history_limit_from_settings() {
    let settings = Settings {
        history_limit: 3,
        ..Settings::default()
    };
    let mut state = AppState::with_settings(sample_project(), &settings);
    assert_eq!(state.history_limit(), 3);
    for i in 0..10 {
        state.set_subtitle(format!("{i}")).unwrap();
    }
    assert_eq!(state.undo_len(), 3);
}

#[test]
fn test_new_mutation_clears_redo() {
    let mut state = AppState::new(sample_project());
    state.set_title("one").unwrap();
    state.set_title("two").unwrap();
    state.undo().unwrap();
    state.undo().unwrap();
    assert_eq!(state.redo_len(), 2);

    state.set_chart_kind(ChartKind::Bar).unwrap();
    assert_eq!(state.redo_len(), 0);
    assert!(matches!(state.redo(), Err(StateError::NothingToRedo)));
}

#[test]
fn test_history_boundaries_report_without_changing_state() {
    let mut state = AppState::new(sample_project());
    let before = state.project().clone();

    assert!(matches!(state.undo(), Err(StateError::NothingToUndo)));
    assert!(matches!(state.redo(), Err(StateError::NothingToRedo)));
    assert_eq!(state.project(), &before);
    assert!(!state.can_undo());
    assert!(!state.can_redo());
}

#[test]
fn test_rejected_mutations_leave_history_untouched() {
    let mut state = AppState::new(sample_project());
    state.set_title("kept").unwrap();
    state.undo().unwrap();
    let before = state.project().clone();

    assert!(matches!(
        state.rename_column("A", "B"),
        Err(StateError::Data(graphsmith::DataError::InvalidName { .. }))
    ));
    assert!(state.rename_column("A", "  ").is_err());
    assert!(matches!(state.delete_row(10), Err(StateError::Data(_))));
    assert!(matches!(
        state.set_x_column(Some("Missing")),
        Err(StateError::ColumnNotFound(_))
    ));
    assert!(matches!(
        state.set_axis(
            AxisId::X,
            AxisConfig::default().with_scale(AxisScale::Log).with_range(Some(-1.0), None)
        ),
        Err(StateError::InvalidAxis { .. })
    ));
    let mut bad_series = SeriesStyle::new("A");
    bad_series.alpha = 1.5;
    assert!(matches!(
        state.set_series_style(bad_series),
        Err(StateError::InvalidSeries { .. })
    ));
    assert!(matches!(state.add_series("A"), Err(StateError::InvalidSeries { .. })));
    assert!(matches!(state.remove_series("Nope"), Err(StateError::SeriesNotFound(_))));

    assert_eq!(state.project(), &before);
    assert_eq!(state.undo_len(), 0);
    assert_eq!(state.redo_len(), 1);
}

#[test]
fn test_transform_reordering_is_undoable() {
    let project = TestProjectBuilder::new()
        .with_column("A", ints(&[Some(1), Some(2)]))
        .with_column("B", ints(&[Some(3), Some(4)]))
        .build();
    let mut state = AppState::new(project);
    let first = state
        .add_transform(TransformKind::Normalize {
            method: NormalizeMethod::MinMax,
            column: "A".into(),
        })
        .unwrap();
    state
        .add_transform(TransformKind::ColumnMath {
            op: MathOp::Add,
            left: "A".into(),
            right: "B".into(),
            result_name: "C".into(),
        })
        .unwrap();
    let normalized_first = state.transformed().dataset.clone();

    state.move_transform(first, 1).unwrap();
    assert_eq!(state.project().transforms[1].id, first);
    assert_ne!(state.transformed().dataset, normalized_first);

    state.undo().unwrap();
    assert_eq!(state.transformed().dataset, normalized_first);
    assert!(matches!(
        state.move_transform(first, 2),
        Err(StateError::TransformOutOfRange { index: 2, len: 2 })
    ));
}

#[test]
fn test_replace_project_clears_history() {
    let mut state = AppState::new(sample_project());
    state.set_title("edited").unwrap();
    state.undo().unwrap();
    state.set_title("again").unwrap();

    let replacement = TestProjectBuilder::new()
        .with_column("A", floats(&[Some(0.5)]))
        .build();
    state.replace_project(replacement.clone());
    assert_eq!(state.project(), &replacement);
    assert!(!state.can_undo());
    assert!(!state.can_redo());
}

#[test]
fn test_set_dataset_undo_restores_cells() {
    let mut state = AppState::new(sample_project());
    state.set_dataset(division_dataset()).unwrap();
    assert_eq!(state.project().dataset.cell(1, "B"), Some(&DataCell::Integer(0)));
    // A and B exist in the new dataset; the stale X selection is not a series
    assert_eq!(state.dangling_series().len(), 0);

    state.undo().unwrap();
    assert_eq!(state.project().dataset.cell(2, "B"), Some(&DataCell::Integer(30)));
}
