//! Recursive-descent parser producing [`Expr`] trees.
//!
//! Every parse function returns the tree depth alongside the node so both
//! parenthesised nesting and long operator chains are bounded.

use super::lexer::{Spanned, Token};
use super::{BinaryOp, Expr, ExpressionError, Function, Scalar, UnaryOp};

type Parsed = Result<(Expr, usize), ExpressionError>;

pub(crate) struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    nesting: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: &'a [Spanned], max_depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            nesting: 0,
            max_depth,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Expr, ExpressionError> {
        let (expr, _) = self.expression()?;
        match self.tokens.get(self.pos) {
            Some(extra) => Err(unexpected(extra)),
            None => Ok(expr),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), ExpressionError> {
        match self.advance() {
            Some(t) if &t.token == token => Ok(()),
            Some(t) => Err(unexpected(t)),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }

    fn check_depth(&self, depth: usize) -> Result<usize, ExpressionError> {
        if depth > self.max_depth {
            Err(ExpressionError::TooDeep {
                max: self.max_depth,
            })
        } else {
            Ok(depth)
        }
    }

    /// Run a nested parse, bounding recursion before the tree exists
    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Parsed) -> Parsed {
        self.nesting += 1;
        let result = if self.nesting > self.max_depth {
            Err(ExpressionError::TooDeep {
                max: self.max_depth,
            })
        } else {
            parse(self)
        };
        self.nesting -= 1;
        result
    }

    fn expression(&mut self) -> Parsed {
        self.nested(Self::or)
    }

    fn left_assoc(
        &mut self,
        operand: fn(&mut Self) -> Parsed,
        operator: fn(&Token) -> Option<BinaryOp>,
    ) -> Parsed {
        let (mut lhs, mut depth) = operand(self)?;
        while let Some(op) = self.peek().and_then(operator) {
            self.pos += 1;
            let (rhs, rhs_depth) = operand(self)?;
            depth = self.check_depth(depth.max(rhs_depth) + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok((lhs, depth))
    }

    fn or(&mut self) -> Parsed {
        self.left_assoc(Self::and, |t| (t == &Token::Or).then_some(BinaryOp::Or))
    }

    fn and(&mut self) -> Parsed {
        self.left_assoc(Self::not, |t| (t == &Token::And).then_some(BinaryOp::And))
    }

    fn not(&mut self) -> Parsed {
        if self.eat(&Token::Not) {
            let (operand, depth) = self.nested(Self::not)?;
            return Ok((
                Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                self.check_depth(depth + 1)?,
            ));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Parsed {
        let (lhs, lhs_depth) = self.additive()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinaryOp::Eq,
            Some(Token::Ne) => BinaryOp::Ne,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            _ => return Ok((lhs, lhs_depth)),
        };
        self.pos += 1;
        let (rhs, rhs_depth) = self.additive()?;
        let depth = self.check_depth(lhs_depth.max(rhs_depth) + 1)?;
        Ok((
            Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            depth,
        ))
    }

    fn additive(&mut self) -> Parsed {
        self.left_assoc(Self::term, |t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn term(&mut self) -> Parsed {
        self.left_assoc(Self::unary, |t| match t {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    fn unary(&mut self) -> Parsed {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.power(),
        };
        self.pos += 1;
        let (operand, depth) = self.nested(Self::unary)?;
        Ok((
            Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            self.check_depth(depth + 1)?,
        ))
    }

    fn power(&mut self) -> Parsed {
        let (base, base_depth) = self.primary()?;
        if !self.eat(&Token::StarStar) {
            return Ok((base, base_depth));
        }
        let (exponent, exp_depth) = self.nested(Self::unary)?;
        let depth = self.check_depth(base_depth.max(exp_depth) + 1)?;
        Ok((
            Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            },
            depth,
        ))
    }

    fn primary(&mut self) -> Parsed {
        let Some(spanned) = self.advance() else {
            return Err(ExpressionError::UnexpectedEnd);
        };
        let literal = |value: Scalar| -> Parsed { Ok((Expr::Literal(value), 1)) };
        match &spanned.token {
            Token::Integer(n) => literal(Scalar::Int(*n)),
            Token::Number(n) => literal(Scalar::Float(*n)),
            Token::Str(s) => literal(Scalar::Text(s.clone())),
            Token::True => literal(Scalar::Bool(true)),
            Token::False => literal(Scalar::Bool(false)),
            Token::Null => literal(Scalar::Null),
            Token::Ident { name, quoted } => {
                if !quoted && self.peek() == Some(&Token::LParen) {
                    self.call(name)
                } else {
                    Ok((Expr::Column(name.clone()), 1))
                }
            }
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            _ => Err(unexpected(spanned)),
        }
    }

    fn call(&mut self, name: &str) -> Parsed {
        let func = Function::from_name(&name.to_ascii_lowercase())
            .ok_or_else(|| ExpressionError::DisallowedFunction(name.to_string()))?;
        self.expect(&Token::LParen)?;

        let mut args = Vec::new();
        let mut depth = 0;
        if !self.eat(&Token::RParen) {
            loop {
                let (arg, arg_depth) = self.expression()?;
                depth = depth.max(arg_depth);
                args.push(arg);
                if !self.eat(&Token::Comma) {
                    self.expect(&Token::RParen)?;
                    break;
                }
            }
        }

        let (min, max) = func.arity();
        if args.len() < min || max.is_some_and(|max| args.len() > max) {
            return Err(ExpressionError::Arity {
                function: func.name(),
                expected: func.arity_label(),
                found: args.len(),
            });
        }
        Ok((Expr::Call { func, args }, self.check_depth(depth + 1)?))
    }
}

fn unexpected(spanned: &Spanned) -> ExpressionError {
    ExpressionError::UnexpectedToken {
        found: spanned.token.describe(),
        pos: spanned.span.start,
    }
}
