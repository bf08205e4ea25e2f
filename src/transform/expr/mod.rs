//! Sandboxed expression language for Filter and ComputedColumn.
//!
//! Expressions are parsed into a small AST and walked by a restricted
//! interpreter. The only names an expression can reach are dataset columns
//! and the functions listed in [`Function`]; any other call is rejected when
//! the expression is parsed.
//!
//! ```text
//! expr       := or
//! or         := and (("or" | "||" | "|") and)*
//! and        := not (("and" | "&&" | "&") not)*
//! not        := ("not" | "!") not | comparison
//! comparison := additive (("==" | "!=" | "<" | "<=" | ">" | ">=") additive)?
//! additive   := term (("+" | "-") term)*
//! term       := unary (("*" | "/" | "%") unary)*
//! unary      := ("-" | "+") unary | power
//! power      := primary ("**" unary)?
//! primary    := number | string | true | false | null
//!             | column | function "(" args ")" | "(" expr ")"
//! column     := identifier | "`" any text "`"
//! ```

mod eval;
mod lexer;
mod parser;

pub use eval::Scalar;

use crate::constants::{MAX_EXPRESSION_DEPTH, MAX_EXPRESSION_LEN};
use crate::data::{DataRow, TabularDataset};
use lexer::{is_bare_identifier, tokenize, Token};
use std::collections::HashMap;
use thiserror::Error;

/// Why an expression was rejected or failed to evaluate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,

    #[error("expression is longer than {max} characters")]
    TooLong { max: usize },

    #[error("expression nests deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("unexpected character {ch:?} at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("invalid number {text:?} at position {pos}")]
    InvalidNumber { text: String, pos: usize },

    #[error("unterminated quote starting at position {pos}")]
    UnterminatedString { pos: usize },

    #[error("unexpected {found} at position {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("function {0:?} is not allowed")]
    DisallowedFunction(String),

    #[error("{function}() takes {expected} argument(s), got {found}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("filter must produce a boolean, got {0}")]
    NotBoolean(&'static str),
}

// ============================================================================
// AST
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Allow-listed functions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    Abs,
    Sqrt,
    Exp,
    Ln,
    Log10,
    Log2,
    Sin,
    Cos,
    Tan,
    Floor,
    Ceil,
    Round,
    Pow,
    Min,
    Max,
    Clip,
    IsNull,
    NotNull,
    Coalesce,
    Contains,
    Lower,
    Upper,
    Len,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Function> {
        Function::all().iter().copied().find(|f| f.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Sqrt => "sqrt",
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Log10 => "log10",
            Function::Log2 => "log2",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Round => "round",
            Function::Pow => "pow",
            Function::Min => "min",
            Function::Max => "max",
            Function::Clip => "clip",
            Function::IsNull => "isnull",
            Function::NotNull => "notnull",
            Function::Coalesce => "coalesce",
            Function::Contains => "contains",
            Function::Lower => "lower",
            Function::Upper => "upper",
            Function::Len => "len",
        }
    }

    pub fn all() -> &'static [Function] {
        &[
            Function::Abs,
            Function::Sqrt,
            Function::Exp,
            Function::Ln,
            Function::Log10,
            Function::Log2,
            Function::Sin,
            Function::Cos,
            Function::Tan,
            Function::Floor,
            Function::Ceil,
            Function::Round,
            Function::Pow,
            Function::Min,
            Function::Max,
            Function::Clip,
            Function::IsNull,
            Function::NotNull,
            Function::Coalesce,
            Function::Contains,
            Function::Lower,
            Function::Upper,
            Function::Len,
        ]
    }

    /// Accepted argument counts as `(min, max)`; `None` is unbounded
    fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Function::Round => (1, Some(2)),
            Function::Pow | Function::Contains => (2, Some(2)),
            Function::Clip => (3, Some(3)),
            Function::Min | Function::Max | Function::Coalesce => (1, None),
            _ => (1, Some(1)),
        }
    }

    fn arity_label(&self) -> &'static str {
        match self.arity() {
            (1, Some(2)) => "1 or 2",
            (2, Some(2)) => "2",
            (3, Some(3)) => "3",
            (_, None) => "at least 1",
            _ => "1",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Scalar),
    Column(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Distinct column names the expression reads, in first-use order
    pub fn columns(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_columns(&mut names);
        names
    }

    fn collect_columns<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Column(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::Unary { operand, .. } => operand.collect_columns(names),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_columns(names);
                rhs.collect_columns(names);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_columns(names);
                }
            }
        }
    }
}

/// Parse expression text into an AST
pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
    if source.chars().count() > MAX_EXPRESSION_LEN {
        return Err(ExpressionError::TooLong {
            max: MAX_EXPRESSION_LEN,
        });
    }
    if source.trim().is_empty() {
        return Err(ExpressionError::Empty);
    }
    let tokens = tokenize(source)?;
    parser::Parser::new(&tokens, MAX_EXPRESSION_DEPTH).parse()
}

/// Rewrite every column reference to `old` as `new`, leaving all other
/// characters untouched. Returns `None` when nothing was rewritten or the
/// text does not tokenize.
pub fn rename_identifier(source: &str, old: &str, new: &str) -> Option<String> {
    let tokens = tokenize(source).ok()?;
    let replacement = if is_bare_identifier(new) {
        new.to_string()
    } else {
        format!("`{new}`")
    };

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    let mut changed = false;
    for (i, spanned) in tokens.iter().enumerate() {
        let Token::Ident { name, quoted } = &spanned.token else {
            continue;
        };
        let is_call = !quoted && matches!(tokens.get(i + 1).map(|t| &t.token), Some(Token::LParen));
        if name == old && !is_call {
            out.push_str(&source[cursor..spanned.span.start]);
            out.push_str(&replacement);
            cursor = spanned.span.end;
            changed = true;
        }
    }
    if !changed {
        return None;
    }
    out.push_str(&source[cursor..]);
    Some(out)
}

/// An expression whose column references are resolved against one dataset
#[derive(Debug)]
pub(crate) struct BoundExpr {
    expr: Expr,
    columns: HashMap<String, usize>,
}

impl BoundExpr {
    /// Parse `source` and check every referenced column exists in `dataset`
    pub(crate) fn compile(source: &str, dataset: &TabularDataset) -> Result<Self, ExpressionError> {
        let expr = parse(source)?;
        let mut columns = HashMap::new();
        for name in expr.columns() {
            let index = dataset
                .column_index(name)
                .ok_or_else(|| ExpressionError::UnknownColumn(name.to_string()))?;
            columns.insert(name.to_string(), index);
        }
        Ok(Self { expr, columns })
    }

    pub(crate) fn eval_row(&self, row: &DataRow) -> Result<Scalar, ExpressionError> {
        eval::eval(&self.expr, &|name: &str| {
            let index = self
                .columns
                .get(name)
                .ok_or_else(|| ExpressionError::UnknownColumn(name.to_string()))?;
            Ok(row.get(*index).map(Scalar::from).unwrap_or(Scalar::Null))
        })
    }
}
