//! Unit tests for the sandboxed expression language.

use crate::helpers::{assert_column, dataset, floats, ints, texts};
use graphsmith::data::DataCell;
use graphsmith::transform::expr::{parse, rename_identifier, Expr, Function};
use graphsmith::transform::{apply_one, ExpressionError, TransformError, TransformKind};

fn computed(expression: &str) -> TransformKind {
    TransformKind::ComputedColumn {
        result_name: "Out".to_string(),
        expression: expression.to_string(),
    }
}

fn filter(expression: &str) -> TransformKind {
    TransformKind::Filter {
        expression: expression.to_string(),
    }
}

// ============================================================================
// Sandbox
// ============================================================================

#[test]
fn test_disallowed_calls_rejected_at_parse() {
    for source in ["__import__('os')", "open('x')", "eval(A)", "exec(1)", "getattr(A, 'b')"] {
        assert!(
            matches!(parse(source), Err(ExpressionError::DisallowedFunction(_))),
            "{source} should be rejected"
        );
    }
}

#[test]
fn test_non_expression_syntax_rejected() {
    for source in ["A.real", "A[0]", "lambda: 1", "A; B", "A = 1", "{1: 2}"] {
        assert!(parse(source).is_err(), "{source} should not parse");
    }
}

#[test]
fn test_length_and_depth_limits() {
    let long = "1".repeat(5000);
    assert!(matches!(parse(&long), Err(ExpressionError::TooLong { .. })));

    let deep = format!("{}1{}", "(".repeat(100), ")".repeat(100));
    assert!(matches!(parse(&deep), Err(ExpressionError::TooDeep { .. })));

    let shallow = format!("{}1{}", "(".repeat(10), ")".repeat(10));
    assert!(parse(&shallow).is_ok());
}

#[test]
fn test_parse_reports_columns_and_calls() {
    let expr = parse("round(`Unit Price` * qty, 2) > qty").unwrap();
    assert_eq!(expr.columns(), vec!["Unit Price", "qty"]);
    let Expr::Binary { lhs, .. } = expr else {
        panic!("expected comparison");
    };
    assert!(matches!(*lhs, Expr::Call { func: Function::Round, .. }));
}

#[test]
fn test_unknown_column_fails_the_transform() {
    let ds = dataset(vec![("A", ints(&[Some(1)]))]);
    let err = apply_one(&ds, &computed("A + Missing")).unwrap_err();
    assert_eq!(
        err,
        TransformError::Expression(ExpressionError::UnknownColumn("Missing".to_string()))
    );
}

// ============================================================================
// Evaluation through transforms
// ============================================================================

#[test]
fn test_computed_column_arithmetic_and_nulls() {
    let ds = dataset(vec![
        ("A", ints(&[Some(4), Some(2), None])),
        ("B", ints(&[Some(2), Some(0), Some(1)])),
    ]);
    let out = apply_one(&ds, &computed("A / B")).unwrap();
    assert_column(&out, "Out", floats(&[Some(2.0), None, None]));

    let out = apply_one(&ds, &computed("coalesce(A, 0) * 10 + B")).unwrap();
    assert_column(&out, "Out", ints(&[Some(42), Some(20), Some(1)]));
}

#[test]
fn test_computed_column_text_functions() {
    let ds = dataset(vec![("Name", texts(&["Alpha", "beta"]))]);
    let out = apply_one(&ds, &computed("upper(Name) + '!'")).unwrap();
    assert_column(&out, "Out", texts(&["ALPHA!", "BETA!"]));

    let out = apply_one(&ds, &computed("len(Name)")).unwrap();
    assert_column(&out, "Out", ints(&[Some(5), Some(4)]));
}

#[test]
fn test_filter_drops_false_and_null() {
    let ds = dataset(vec![("A", ints(&[Some(1), None, Some(5), Some(3)]))]);
    let out = apply_one(&ds, &filter("A >= 3 and notnull(A)")).unwrap();
    assert_column(&out, "A", ints(&[Some(5), Some(3)]));

    let out = apply_one(&ds, &filter("A > 2 or isnull(A)")).unwrap();
    assert_column(&out, "A", ints(&[None, Some(5), Some(3)]));
}

#[test]
fn test_filter_requires_boolean() {
    let ds = dataset(vec![("A", ints(&[Some(1)]))]);
    let err = apply_one(&ds, &filter("A + 1")).unwrap_err();
    assert!(matches!(
        err,
        TransformError::Expression(ExpressionError::NotBoolean("number"))
    ));
}

#[test]
fn test_backquoted_columns() {
    let ds = dataset(vec![("Unit Price", floats(&[Some(2.5)])), ("qty", ints(&[Some(4)]))]);
    let out = apply_one(&ds, &computed("`Unit Price` * qty")).unwrap();
    assert_eq!(out.cell(0, "Out"), Some(&DataCell::Float(10.0)));
}

#[test]
fn test_rename_identifier_preserves_text() {
    assert_eq!(
        rename_identifier("A  +  max(A, B)  # not a comment", "A", "Alpha"),
        None,
        "text that does not tokenize is left alone"
    );
    assert_eq!(
        rename_identifier("A  +  max(A, B)", "A", "Alpha").as_deref(),
        Some("Alpha  +  max(Alpha, B)")
    );
    assert_eq!(
        rename_identifier("A > 0", "A", "Net Sales").as_deref(),
        Some("`Net Sales` > 0")
    );
    assert_eq!(rename_identifier("B > 0", "A", "Z"), None);
}
