//! Property tests for history, persistence and the pipeline

use graphsmith::app::AppState;
use graphsmith::data::{ColumnType, DataCell, TabularDataset};
use graphsmith::project::ProjectState;
use graphsmith::project_io::{deserialize, serialize};
use graphsmith::transform::{apply, MathOp, NormalizeMethod, Transform, TransformKind};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    SetTitle(String),
    SetCell(usize, i64),
    InsertRow(usize),
    DeleteRow(usize),
    AddColumn,
    ToggleLegend,
}

fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z]{0,6}".prop_map(Op::SetTitle),
        (0usize..6, -100i64..100).prop_map(|(row, v)| Op::SetCell(row, v)),
        (0usize..6).prop_map(Op::InsertRow),
        (0usize..6).prop_map(Op::DeleteRow),
        Just(Op::AddColumn),
        Just(Op::ToggleLegend),
    ]
}

/// Apply `op`, returning whether it committed
fn run(state: &mut AppState, op: &Op) -> bool {
    let result = match op {
        Op::SetTitle(title) => state.set_title(title.clone()),
        Op::SetCell(row, v) => state.set_cell(*row, "A", &v.to_string()),
        Op::InsertRow(index) => state.insert_row(*index),
        Op::DeleteRow(index) => state.delete_row(*index),
        Op::AddColumn => state.add_column(ColumnType::Float).map(|_| ()),
        Op::ToggleLegend => {
            let mut legend = state.project().chart.legend;
            legend.show = !legend.show;
            state.set_legend(legend)
        }
    };
    result.is_ok()
}

fn start() -> ProjectState {
    let ds = TabularDataset::from_columns(
        "p",
        vec![
            ("X".to_string(), (0..3).map(DataCell::Integer).collect()),
            ("A".to_string(), (0..3).map(|v| DataCell::Integer(v * 10)).collect()),
        ],
    )
    .unwrap();
    ProjectState::from_dataset(ds)
}

fn cell() -> impl Strategy<Value = DataCell> {
    prop_oneof![
        Just(DataCell::Empty),
        any::<i64>().prop_map(DataCell::Integer),
        (-1e9f64..1e9).prop_map(DataCell::float),
    ]
}

fn numeric_dataset() -> impl Strategy<Value = TabularDataset> {
    (1usize..12).prop_flat_map(|rows| {
        (
            prop::collection::vec(cell(), rows),
            prop::collection::vec(cell(), rows),
            prop::collection::vec("[a-z]{0,4}", rows),
        )
            .prop_map(|(a, b, labels)| {
                TabularDataset::from_columns(
                    "generated",
                    vec![
                        ("A".to_string(), a),
                        ("B".to_string(), b),
                        ("Label".to_string(), labels.into_iter().map(DataCell::text).collect()),
                    ],
                )
                .unwrap()
            })
    })
}

proptest! {
    #[test]
    fn undo_walks_back_through_every_commit(ops in prop::collection::vec(any_op(), 0..40)) {
        let mut state = AppState::new(start());
        let mut snapshots = vec![state.project().clone()];
        for op in &ops {
            if run(&mut state, op) {
                snapshots.push(state.project().clone());
            } else {
                prop_assert_eq!(state.project(), snapshots.last().unwrap());
            }
        }

        for expected in snapshots.iter().rev().skip(1) {
            state.undo().unwrap();
            prop_assert_eq!(state.project(), expected);
        }
        prop_assert!(state.undo().is_err());

        for expected in snapshots.iter().skip(1) {
            state.redo().unwrap();
            prop_assert_eq!(state.project(), expected);
        }
        prop_assert!(state.redo().is_err());
    }

    #[test]
    fn history_never_exceeds_capacity(ops in prop::collection::vec(any_op(), 0..150)) {
        let mut state = AppState::new(start());
        let mut commits = 0usize;
        for op in &ops {
            if run(&mut state, op) {
                commits += 1;
            }
            prop_assert!(state.undo_len() <= 50);
        }
        prop_assert_eq!(state.undo_len(), commits.min(50));
    }

    #[test]
    fn project_round_trips(ds in numeric_dataset(), title in ".{0,12}") {
        let mut project = ProjectState::from_dataset(ds);
        project.chart.title = title;
        project.transforms.push(Transform::new(TransformKind::Normalize {
            method: NormalizeMethod::ZScore,
            column: "A".into(),
        }));
        let loaded = deserialize(&serialize(&project).unwrap()).unwrap();
        prop_assert_eq!(loaded, project);
    }

    #[test]
    fn min_max_stays_in_unit_range(ds in numeric_dataset()) {
        let out = apply(&ds, &[Transform::new(TransformKind::Normalize {
            method: NormalizeMethod::MinMax,
            column: "A".into(),
        })]);
        if out.warnings.is_empty() {
            let idx = out.dataset.column_index("A").unwrap();
            for value in out.dataset.column_cells(idx).filter_map(DataCell::as_f64) {
                prop_assert!((0.0..=1.0).contains(&value), "{}", value);
            }
        }
    }

    #[test]
    fn toggling_a_transform_is_idempotent(ds in numeric_dataset(), which in 0usize..3) {
        let mut transforms = vec![
            Transform::new(TransformKind::ColumnMath {
                op: MathOp::Mul,
                left: "A".into(),
                right: "B".into(),
                result_name: "C".into(),
            }),
            Transform::new(TransformKind::Filter { expression: "notnull(A)".into() }),
            Transform::new(TransformKind::Normalize {
                method: NormalizeMethod::Robust,
                column: "B".into(),
            }),
        ];
        let original = apply(&ds, &transforms);

        transforms[which].enabled = false;
        let disabled = apply(&ds, &transforms);
        prop_assert_eq!(disabled.skipped_disabled, 1);

        transforms[which].enabled = true;
        prop_assert_eq!(apply(&ds, &transforms), original);
    }
}
