//! Tokenizer for filter and computed-column expressions.

use super::ExpressionError;
use std::ops::Range;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Integer(i64),
    Str(String),
    /// Column or function name; `quoted` when written in backticks
    Ident { name: String, quoted: bool },
    True,
    False,
    Null,
    And,
    Or,
    Not,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
    Comma,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Integer(n) => n.to_string(),
            Token::Str(s) => format!("{s:?}"),
            Token::Ident { name, .. } => name.clone(),
            Token::True => "true".to_string(),
            Token::False => "false".to_string(),
            Token::Null => "null".to_string(),
            Token::And => "and".to_string(),
            Token::Or => "or".to_string(),
            Token::Not => "not".to_string(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::StarStar => "**".to_string(),
            Token::Slash => "/".to_string(),
            Token::Percent => "%".to_string(),
            Token::Eq => "==".to_string(),
            Token::Ne => "!=".to_string(),
            Token::Lt => "<".to_string(),
            Token::Le => "<=".to_string(),
            Token::Gt => ">".to_string(),
            Token::Ge => ">=".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::Comma => ",".to_string(),
        }
    }
}

/// A token plus the byte range it occupies in the source
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match c {
            '0'..='9' | '.' => {
                let mut end = start;
                let mut text = String::new();
                let mut seen_exponent = false;
                while let Some(&(i, ch)) = chars.peek() {
                    let sign_after_exponent =
                        (ch == '+' || ch == '-') && seen_exponent && text.ends_with(['e', 'E']);
                    if ch.is_ascii_digit() || ch == '.' || sign_after_exponent {
                        text.push(ch);
                    } else if (ch == 'e' || ch == 'E') && !seen_exponent {
                        seen_exponent = true;
                        text.push(ch);
                    } else {
                        break;
                    }
                    end = i + ch.len_utf8();
                    chars.next();
                }
                let token = if let Ok(n) = text.parse::<i64>() {
                    Token::Integer(n)
                } else {
                    match text.parse::<f64>() {
                        Ok(n) if n.is_finite() => Token::Number(n),
                        _ => {
                            return Err(ExpressionError::InvalidNumber {
                                text,
                                pos: start,
                            });
                        }
                    }
                };
                tokens.push(Spanned {
                    token,
                    span: start..end,
                });
                continue;
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut text = String::new();
                let mut closed = None;
                while let Some((i, ch)) = chars.next() {
                    if ch == '\\' {
                        if let Some((_, escaped)) = chars.next() {
                            text.push(escaped);
                        }
                    } else if ch == quote {
                        closed = Some(i + 1);
                        break;
                    } else {
                        text.push(ch);
                    }
                }
                let end = closed.ok_or(ExpressionError::UnterminatedString { pos: start })?;
                tokens.push(Spanned {
                    token: Token::Str(text),
                    span: start..end,
                });
                continue;
            }
            '`' => {
                chars.next();
                let mut name = String::new();
                let mut closed = None;
                for (i, ch) in chars.by_ref() {
                    if ch == '`' {
                        closed = Some(i + 1);
                        break;
                    }
                    name.push(ch);
                }
                let end = closed.ok_or(ExpressionError::UnterminatedString { pos: start })?;
                tokens.push(Spanned {
                    token: Token::Ident { name, quoted: true },
                    span: start..end,
                });
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start;
                let mut word = String::new();
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        word.push(ch);
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" | "none" => Token::Null,
                    _ => Token::Ident {
                        name: word,
                        quoted: false,
                    },
                };
                tokens.push(Spanned {
                    token,
                    span: start..end,
                });
                continue;
            }
            _ => {
                chars.next();
                let next = chars.peek().map(|&(_, ch)| ch);
                let (token, len) = match (c, next) {
                    ('*', Some('*')) => (Token::StarStar, 2),
                    ('=', Some('=')) => (Token::Eq, 2),
                    ('!', Some('=')) => (Token::Ne, 2),
                    ('<', Some('=')) => (Token::Le, 2),
                    ('>', Some('=')) => (Token::Ge, 2),
                    ('&', Some('&')) => (Token::And, 2),
                    ('|', Some('|')) => (Token::Or, 2),
                    ('+', _) => (Token::Plus, 1),
                    ('-', _) => (Token::Minus, 1),
                    ('*', _) => (Token::Star, 1),
                    ('/', _) => (Token::Slash, 1),
                    ('%', _) => (Token::Percent, 1),
                    ('<', _) => (Token::Lt, 1),
                    ('>', _) => (Token::Gt, 1),
                    ('!', _) => (Token::Not, 1),
                    ('&', _) => (Token::And, 1),
                    ('|', _) => (Token::Or, 1),
                    ('(', _) => (Token::LParen, 1),
                    (')', _) => (Token::RParen, 1),
                    (',', _) => (Token::Comma, 1),
                    _ => return Err(ExpressionError::UnexpectedChar { ch: c, pos: start }),
                };
                if len == 2 {
                    chars.next();
                }
                Spanned {
                    token,
                    span: start..start + len,
                }
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// Whether `name` can be written without backticks
pub(crate) fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !matches!(
            name.to_ascii_lowercase().as_str(),
            "and" | "or" | "not" | "true" | "false" | "null" | "none"
        )
}
