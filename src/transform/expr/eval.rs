//! Tree-walking interpreter for parsed expressions.
//!
//! Null propagates through arithmetic, comparisons and most functions.
//! `and`/`or` use three-valued logic. Results that are not finite numbers
//! (division by zero, `sqrt(-1)`) become null.

use super::{BinaryOp, Expr, ExpressionError, Function, UnaryOp};
use crate::data::{parse_datetime, DataCell};
use chrono::NaiveDateTime;
use std::cmp::Ordering;

/// A single value produced while evaluating an expression
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Int(_) | Scalar::Float(_) => "number",
            Scalar::Text(_) => "text",
            Scalar::Bool(_) => "boolean",
            Scalar::DateTime(_) => "datetime",
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(n) => Some(*n as f64),
            Scalar::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn into_cell(self) -> DataCell {
        match self {
            Scalar::Null => DataCell::Empty,
            Scalar::Int(n) => DataCell::Integer(n),
            Scalar::Float(n) => DataCell::float(n),
            Scalar::Text(s) => DataCell::Text(s),
            Scalar::Bool(b) => DataCell::Boolean(b),
            Scalar::DateTime(dt) => DataCell::DateTime(dt),
        }
    }
}

impl From<&DataCell> for Scalar {
    fn from(cell: &DataCell) -> Self {
        match cell {
            DataCell::Integer(n) => Scalar::Int(*n),
            DataCell::Float(n) => Scalar::Float(*n),
            DataCell::Text(s) => Scalar::Text(s.clone()),
            DataCell::DateTime(dt) => Scalar::DateTime(*dt),
            DataCell::Boolean(b) => Scalar::Bool(*b),
            DataCell::Empty => Scalar::Null,
        }
    }
}

type Lookup<'a> = &'a dyn Fn(&str) -> Result<Scalar, ExpressionError>;

pub(crate) fn eval(expr: &Expr, lookup: Lookup<'_>) -> Result<Scalar, ExpressionError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Column(name) => lookup(name),
        Expr::Unary { op, operand } => unary(*op, eval(operand, lookup)?),
        Expr::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
        } => {
            let left = truth(eval(lhs, lookup)?, "and")?;
            if left == Some(false) {
                return Ok(Scalar::Bool(false));
            }
            let right = truth(eval(rhs, lookup)?, "and")?;
            Ok(match (left, right) {
                (_, Some(false)) => Scalar::Bool(false),
                (Some(true), Some(true)) => Scalar::Bool(true),
                _ => Scalar::Null,
            })
        }
        Expr::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
        } => {
            let left = truth(eval(lhs, lookup)?, "or")?;
            if left == Some(true) {
                return Ok(Scalar::Bool(true));
            }
            let right = truth(eval(rhs, lookup)?, "or")?;
            Ok(match (left, right) {
                (_, Some(true)) => Scalar::Bool(true),
                (Some(false), Some(false)) => Scalar::Bool(false),
                _ => Scalar::Null,
            })
        }
        Expr::Binary { op, lhs, rhs } => {
            let left = eval(lhs, lookup)?;
            let right = eval(rhs, lookup)?;
            match op {
                BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge => compare(*op, &left, &right),
                _ => arithmetic(*op, left, right),
            }
        }
        Expr::Call { func, args } => {
            let values = args
                .iter()
                .map(|arg| eval(arg, lookup))
                .collect::<Result<Vec<_>, _>>()?;
            call(*func, values)
        }
    }
}

fn type_error(message: String) -> ExpressionError {
    ExpressionError::Type(message)
}

fn float(value: f64) -> Scalar {
    if value.is_finite() {
        Scalar::Float(value)
    } else {
        Scalar::Null
    }
}

fn truth(value: Scalar, op: &str) -> Result<Option<bool>, ExpressionError> {
    match value {
        Scalar::Bool(b) => Ok(Some(b)),
        Scalar::Null => Ok(None),
        other => Err(type_error(format!(
            "'{op}' needs boolean operands, got {}",
            other.type_name()
        ))),
    }
}

fn unary(op: UnaryOp, value: Scalar) -> Result<Scalar, ExpressionError> {
    match (op, value) {
        (_, Scalar::Null) => Ok(Scalar::Null),
        (UnaryOp::Not, Scalar::Bool(b)) => Ok(Scalar::Bool(!b)),
        (UnaryOp::Neg, Scalar::Int(n)) => Ok(n
            .checked_neg()
            .map(Scalar::Int)
            .unwrap_or_else(|| float(-(n as f64)))),
        (UnaryOp::Neg, Scalar::Float(n)) => Ok(Scalar::Float(-n)),
        (UnaryOp::Plus, v @ (Scalar::Int(_) | Scalar::Float(_))) => Ok(v),
        (op, v) => {
            let symbol = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Plus => "+",
                UnaryOp::Not => "not",
            };
            Err(type_error(format!("cannot apply '{symbol}' to {}", v.type_name())))
        }
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        BinaryOp::Pow => "**",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}

fn arithmetic(op: BinaryOp, left: Scalar, right: Scalar) -> Result<Scalar, ExpressionError> {
    match (left, right) {
        (Scalar::Null, _) | (_, Scalar::Null) => Ok(Scalar::Null),
        (Scalar::Int(x), Scalar::Int(y)) => Ok(int_arithmetic(op, x, y)),
        (Scalar::Text(x), Scalar::Text(y)) if op == BinaryOp::Add => Ok(Scalar::Text(x + &y)),
        (left, right) => match (left.as_f64(), right.as_f64()) {
            (Some(x), Some(y)) => Ok(float(float_arithmetic(op, x, y))),
            _ => Err(type_error(format!(
                "cannot apply '{}' to {} and {}",
                op_symbol(op),
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

/// Integer arithmetic, falling back to floats on overflow, division and
/// negative exponents
fn int_arithmetic(op: BinaryOp, x: i64, y: i64) -> Scalar {
    let exact = match op {
        BinaryOp::Add => x.checked_add(y),
        BinaryOp::Sub => x.checked_sub(y),
        BinaryOp::Mul => x.checked_mul(y),
        BinaryOp::Rem if y == 0 => return Scalar::Null,
        BinaryOp::Rem => x
            .checked_rem(y)
            .map(|r| if r != 0 && (r < 0) != (y < 0) { r + y } else { r }),
        BinaryOp::Pow => u32::try_from(y).ok().and_then(|exp| x.checked_pow(exp)),
        _ => None,
    };
    exact
        .map(Scalar::Int)
        .unwrap_or_else(|| float(float_arithmetic(op, x as f64, y as f64)))
}

fn float_arithmetic(op: BinaryOp, x: f64, y: f64) -> f64 {
    match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        // Result takes the sign of the divisor
        BinaryOp::Rem => x - y * (x / y).floor(),
        BinaryOp::Pow => x.powf(y),
        _ => f64::NAN,
    }
}

/// Order two non-null values of compatible types
fn order(left: &Scalar, right: &Scalar) -> Result<Ordering, ExpressionError> {
    let ordering = match (left, right) {
        (Scalar::Int(x), Scalar::Int(y)) => Some(x.cmp(y)),
        (Scalar::Text(x), Scalar::Text(y)) => Some(x.cmp(y)),
        (Scalar::Bool(x), Scalar::Bool(y)) => Some(x.cmp(y)),
        (Scalar::DateTime(x), Scalar::DateTime(y)) => Some(x.cmp(y)),
        (Scalar::DateTime(x), Scalar::Text(s)) => parse_datetime(s).map(|y| x.cmp(&y)),
        (Scalar::Text(s), Scalar::DateTime(y)) => parse_datetime(s).map(|x| x.cmp(y)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    };
    ordering.ok_or_else(|| {
        type_error(format!(
            "cannot compare {} with {}",
            left.type_name(),
            right.type_name()
        ))
    })
}

fn compare(op: BinaryOp, left: &Scalar, right: &Scalar) -> Result<Scalar, ExpressionError> {
    if matches!(left, Scalar::Null) || matches!(right, Scalar::Null) {
        return Ok(Scalar::Null);
    }
    let ordering = order(left, right)?;
    let result = match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        _ => return Err(type_error(format!("'{}' is not a comparison", op_symbol(op)))),
    };
    Ok(Scalar::Bool(result))
}

fn arg(args: &[Scalar], index: usize) -> &Scalar {
    args.get(index).unwrap_or(&Scalar::Null)
}

fn math(func: Function, value: &Scalar, f: fn(f64) -> f64) -> Result<Scalar, ExpressionError> {
    match value {
        Scalar::Null => Ok(Scalar::Null),
        v => v.as_f64().map(|x| float(f(x))).ok_or_else(|| {
            type_error(format!("{}() expects a number, got {}", func.name(), v.type_name()))
        }),
    }
}

fn text_arg<'a>(func: Function, value: &'a Scalar) -> Result<Option<&'a str>, ExpressionError> {
    match value {
        Scalar::Null => Ok(None),
        Scalar::Text(s) => Ok(Some(s)),
        v => Err(type_error(format!(
            "{}() expects text, got {}",
            func.name(),
            v.type_name()
        ))),
    }
}

fn call(func: Function, args: Vec<Scalar>) -> Result<Scalar, ExpressionError> {
    let first = arg(&args, 0);
    match func {
        Function::Abs => match first {
            Scalar::Int(n) => Ok(n
                .checked_abs()
                .map(Scalar::Int)
                .unwrap_or_else(|| float((*n as f64).abs()))),
            v => math(func, v, f64::abs),
        },
        Function::Sqrt => math(func, first, f64::sqrt),
        Function::Exp => math(func, first, f64::exp),
        Function::Ln => math(func, first, f64::ln),
        Function::Log10 => math(func, first, f64::log10),
        Function::Log2 => math(func, first, f64::log2),
        Function::Sin => math(func, first, f64::sin),
        Function::Cos => math(func, first, f64::cos),
        Function::Tan => math(func, first, f64::tan),
        Function::Floor => math(func, first, f64::floor),
        Function::Ceil => math(func, first, f64::ceil),
        Function::Round => {
            let digits = match arg(&args, 1) {
                Scalar::Null => 0,
                Scalar::Int(n) => i32::try_from(*n)
                    .map_err(|_| type_error(format!("round() digits out of range: {n}")))?,
                v => {
                    return Err(type_error(format!(
                        "round() digits must be an integer, got {}",
                        v.type_name()
                    )));
                }
            };
            let factor = 10f64.powi(digits);
            math(func, first, |x| x)
                .map(|v| match v {
                    Scalar::Float(x) => float((x * factor).round() / factor),
                    other => other,
                })
        }
        Function::Pow => arithmetic(BinaryOp::Pow, first.clone(), arg(&args, 1).clone()),
        Function::Min | Function::Max => {
            let mut best: Option<&Scalar> = None;
            for value in args.iter().filter(|v| !matches!(v, Scalar::Null)) {
                best = match best {
                    None => Some(value),
                    Some(current) => {
                        let ordering = order(value, current)?;
                        let better = if func == Function::Min {
                            ordering == Ordering::Less
                        } else {
                            ordering == Ordering::Greater
                        };
                        Some(if better { value } else { current })
                    }
                };
            }
            Ok(best.cloned().unwrap_or(Scalar::Null))
        }
        Function::Clip => {
            let (value, low, high) = (first, arg(&args, 1), arg(&args, 2));
            if matches!(value, Scalar::Null) {
                return Ok(Scalar::Null);
            }
            let mut clipped = value.clone();
            if !matches!(low, Scalar::Null) && order(&clipped, low)? == Ordering::Less {
                clipped = low.clone();
            }
            if !matches!(high, Scalar::Null) && order(&clipped, high)? == Ordering::Greater {
                clipped = high.clone();
            }
            Ok(clipped)
        }
        Function::IsNull => Ok(Scalar::Bool(matches!(first, Scalar::Null))),
        Function::NotNull => Ok(Scalar::Bool(!matches!(first, Scalar::Null))),
        Function::Coalesce => Ok(args
            .into_iter()
            .find(|v| !matches!(v, Scalar::Null))
            .unwrap_or(Scalar::Null)),
        Function::Contains => {
            match (text_arg(func, first)?, text_arg(func, arg(&args, 1))?) {
                (Some(haystack), Some(needle)) => Ok(Scalar::Bool(haystack.contains(needle))),
                _ => Ok(Scalar::Null),
            }
        }
        Function::Lower => Ok(text_arg(func, first)?
            .map(|s| Scalar::Text(s.to_lowercase()))
            .unwrap_or(Scalar::Null)),
        Function::Upper => Ok(text_arg(func, first)?
            .map(|s| Scalar::Text(s.to_uppercase()))
            .unwrap_or(Scalar::Null)),
        Function::Len => Ok(text_arg(func, first)?
            .map(|s| Scalar::Int(s.chars().count() as i64))
            .unwrap_or(Scalar::Null)),
    }
}
