//! Compiled match expressions and their text form.
//!
//! The text form is what the compiled decision document stores in its
//! expression columns, e.g. `contains(upper(merchant), "USPS")` or
//! `(amount >= 10) and (amount <= 250)`.

use crate::error::{EvalError, GlRulesError};
use crate::model::{Field, FieldValue, InputContext};
use rust_decimal::Decimal;
use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
}

impl TextOp {
    fn function_name(&self) -> Option<&'static str> {
        match self {
            TextOp::Equals => None,
            TextOp::Contains => Some("contains"),
            TextOp::StartsWith => Some("startsWith"),
            TextOp::EndsWith => Some("endsWith"),
        }
    }

    fn from_function_name(name: &str) -> Option<TextOp> {
        match name {
            "contains" => Some(TextOp::Contains),
            "startsWith" => Some(TextOp::StartsWith),
            "endsWith" => Some(TextOp::EndsWith),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Ge,
    Le,
    Gt,
    Lt,
}

impl CompareOp {
    fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
        }
    }

    fn holds(&self, value: Decimal, bound: Decimal) -> bool {
        match self {
            CompareOp::Ge => value >= bound,
            CompareOp::Le => value <= bound,
            CompareOp::Gt => value > bound,
            CompareOp::Lt => value < bound,
        }
    }
}

/// A boolean predicate over one or more input fields.
///
/// Text operations upper-case the field value before comparing; the needle
/// is stored as it should be compared (the pattern compiler upper-cases it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Text {
        field: Field,
        op: TextOp,
        needle: String,
    },
    Compare {
        field: Field,
        op: CompareOp,
        bound: Decimal,
    },
    All(Vec<Expression>),
}

impl Expression {
    /// Evaluate against an input. Pure: no state is touched.
    pub fn evaluate(&self, input: &InputContext) -> Result<bool, EvalError> {
        match self {
            Expression::Text { field, op, needle } => {
                let value = match input.value(*field) {
                    FieldValue::Text(s) => s.to_uppercase(),
                    other => {
                        return Err(EvalError::TypeMismatch {
                            field: field.name(),
                            expected: "text",
                            actual: other.kind(),
                        })
                    }
                };
                Ok(match op {
                    TextOp::Equals => value == *needle,
                    TextOp::Contains => value.contains(needle.as_str()),
                    TextOp::StartsWith => value.starts_with(needle.as_str()),
                    TextOp::EndsWith => value.ends_with(needle.as_str()),
                })
            }
            Expression::Compare { field, op, bound } => match input.value(*field) {
                FieldValue::Number(n) => Ok(op.holds(n, *bound)),
                other => Err(EvalError::TypeMismatch {
                    field: field.name(),
                    expected: "a number",
                    actual: other.kind(),
                }),
            },
            Expression::All(parts) => {
                for part in parts {
                    if !part.evaluate(input)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Parse the text form back into an expression.
    pub fn parse(source: &str) -> Result<Expression, GlRulesError> {
        Parser::new(source)?.parse_all()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Text { field, op, needle } => {
                let needle = quote(needle);
                match op.function_name() {
                    Some(func) => write!(f, "{func}(upper({field}), {needle})"),
                    None => write!(f, "upper({field}) == {needle}"),
                }
            }
            Expression::Compare { field, op, bound } => {
                write!(f, "{field} {} {bound}", op.symbol())
            }
            Expression::All(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" and ")?;
                    }
                    match part {
                        Expression::Text { .. } => write!(f, "{part}")?,
                        _ if parts.len() == 1 => write!(f, "{part}")?,
                        _ => write!(f, "({part})")?,
                    }
                }
                Ok(())
            }
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(Decimal),
    LParen,
    RParen,
    Comma,
    EqEq,
    Cmp(CompareOp),
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars: Peekable<CharIndices<'_>> = source.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | ',' => {
                chars.next();
                tokens.push(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    _ => Token::Comma,
                });
            }
            '=' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => tokens.push(Token::EqEq),
                    _ => return Err(format!("expected '==' at offset {pos}")),
                }
            }
            '>' | '<' => {
                chars.next();
                let or_equal = matches!(chars.peek(), Some(&(_, '=')));
                if or_equal {
                    chars.next();
                }
                tokens.push(Token::Cmp(match (c, or_equal) {
                    ('>', true) => CompareOp::Ge,
                    ('>', false) => CompareOp::Gt,
                    ('<', true) => CompareOp::Le,
                    _ => CompareOp::Lt,
                }));
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                let mut closed = false;
                while let Some((_, ch)) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some((_, escaped)) => s.push(escaped),
                            None => break,
                        },
                        '"' => {
                            closed = true;
                            break;
                        }
                        _ => s.push(ch),
                    }
                }
                if !closed {
                    return Err(format!("unterminated string starting at offset {pos}"));
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let mut text = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' || (ch == '-' && text.is_empty()) {
                        text.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = Decimal::from_str(&text)
                    .map_err(|e| format!("invalid number '{text}': {e}"))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut ident = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(format!("unexpected character '{other}' at offset {pos}")),
        }
    }

    Ok(tokens)
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str) -> Result<Self, GlRulesError> {
        let tokens = tokenize(source).map_err(|reason| GlRulesError::InvalidExpression {
            expression: source.to_string(),
            reason,
        })?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
        })
    }

    fn parse_all(&mut self) -> Result<Expression, GlRulesError> {
        if self.tokens.is_empty() {
            return Err(self.error("empty expression"));
        }
        let expr = self.parse_conjunction()?;
        if self.pos < self.tokens.len() {
            return Err(self.error(&format!("unexpected {:?}", self.tokens[self.pos])));
        }
        Ok(expr)
    }

    fn parse_conjunction(&mut self) -> Result<Expression, GlRulesError> {
        let mut parts = vec![self.parse_term()?];
        while matches!(self.peek(), Some(Token::Ident(word)) if word == "and") {
            self.pos += 1;
            parts.push(self.parse_term()?);
        }
        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            // Flatten nested conjunctions so `(a and b) and c` equals `a and b and c`.
            let mut flat = Vec::with_capacity(parts.len());
            for part in parts {
                match part {
                    Expression::All(inner) => flat.extend(inner),
                    other => flat.push(other),
                }
            }
            Ok(Expression::All(flat))
        }
    }

    fn parse_term(&mut self) -> Result<Expression, GlRulesError> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_conjunction()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(word)) if word == "upper" => {
                let field = self.parse_upper_argument()?;
                self.expect(&Token::EqEq)?;
                let needle = self.expect_string()?;
                Ok(Expression::Text {
                    field,
                    op: TextOp::Equals,
                    needle,
                })
            }
            Some(Token::Ident(word)) => {
                if let Some(op) = TextOp::from_function_name(&word) {
                    self.expect(&Token::LParen)?;
                    self.expect_ident("upper")?;
                    let field = self.parse_upper_argument()?;
                    self.expect(&Token::Comma)?;
                    let needle = self.expect_string()?;
                    self.expect(&Token::RParen)?;
                    return Ok(Expression::Text { field, op, needle });
                }
                let field = self.field(&word)?;
                let op = match self.next() {
                    Some(Token::Cmp(op)) => op,
                    other => {
                        return Err(
                            self.error(&format!("expected comparison after '{word}', found {other:?}"))
                        )
                    }
                };
                match self.next() {
                    Some(Token::Num(bound)) => Ok(Expression::Compare { field, op, bound }),
                    other => Err(self.error(&format!("expected number, found {other:?}"))),
                }
            }
            other => Err(self.error(&format!("unexpected {other:?}"))),
        }
    }

    /// Parses `(field)` after `upper`.
    fn parse_upper_argument(&mut self) -> Result<Field, GlRulesError> {
        self.expect(&Token::LParen)?;
        let field = match self.next() {
            Some(Token::Ident(name)) => self.field(&name)?,
            other => return Err(self.error(&format!("expected field name, found {other:?}"))),
        };
        self.expect(&Token::RParen)?;
        Ok(field)
    }

    fn field(&self, name: &str) -> Result<Field, GlRulesError> {
        Field::from_name(name).ok_or_else(|| self.error(&format!("unknown field '{name}'")))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), GlRulesError> {
        match self.next() {
            Some(ref t) if t == expected => Ok(()),
            other => Err(self.error(&format!("expected {expected:?}, found {other:?}"))),
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<(), GlRulesError> {
        match self.next() {
            Some(Token::Ident(ref word)) if word == expected => Ok(()),
            other => Err(self.error(&format!("expected '{expected}', found {other:?}"))),
        }
    }

    fn expect_string(&mut self) -> Result<String, GlRulesError> {
        match self.next() {
            Some(Token::Str(s)) => Ok(s),
            other => Err(self.error(&format!("expected string, found {other:?}"))),
        }
    }

    fn error(&self, reason: &str) -> GlRulesError {
        GlRulesError::InvalidExpression {
            expression: self.source.to_string(),
            reason: reason.to_string(),
        }
    }
}
