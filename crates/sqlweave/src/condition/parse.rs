//! Grammar: `IDENT OPERATOR value-clause`.

use super::lexer::{Lexer, Token, TokenKind};
use super::{Condition, Op};
use crate::error::{WeaveError, WeaveResult};
use crate::value::{SqlValue, coerce_literal};

const LIKE_SHAPE: &str = "LIKE requires a quoted string";
const BETWEEN_SHAPE: &str = "BETWEEN requires <low> AND <high>";

pub(super) fn parse_condition(text: &str) -> WeaveResult<Condition> {
    let tokens = Lexer::new(text).tokenize()?;
    let mut iter = tokens.iter();

    let field = match iter.next() {
        Some(t) if t.kind == TokenKind::Ident => t,
        Some(t) => return Err(WeaveError::parse(text, t.offset, "expected a field name")),
        None => return Err(WeaveError::parse(text, 0, "empty condition")),
    };
    let Some(op_token) = iter.next() else {
        return Err(WeaveError::parse(text, text.len(), "expected an operator"));
    };
    let rest = iter.as_slice();

    let (op, values) = match op_token.kind {
        TokenKind::IsNull => (Op::IsNull, expect_end(text, rest, Vec::new())?),
        TokenKind::IsNotNull => (Op::IsNotNull, expect_end(text, rest, Vec::new())?),
        TokenKind::Comparison => {
            let op: Op = op_token.text.parse()?;
            let value = scalar(text, rest.first(), op_token)?;
            (op, expect_end(text, &rest[1..], vec![value])?)
        }
        TokenKind::Like | TokenKind::Ilike => {
            let op = if op_token.kind == TokenKind::Like {
                Op::Like
            } else {
                Op::Ilike
            };
            match rest.first() {
                Some(t) if t.kind == TokenKind::Str => {
                    let value = SqlValue::Text(t.text.clone());
                    (op, expect_end(text, &rest[1..], vec![value])?)
                }
                Some(t) => return Err(WeaveError::parse(text, t.offset, LIKE_SHAPE)),
                None => return Err(WeaveError::parse(text, text.len(), LIKE_SHAPE)),
            }
        }
        TokenKind::Between => {
            let low = scalar(text, rest.first(), op_token)?;
            match rest.get(1) {
                Some(t) if t.kind == TokenKind::And => {}
                Some(t) => return Err(WeaveError::parse(text, t.offset, BETWEEN_SHAPE)),
                None => return Err(WeaveError::parse(text, text.len(), BETWEEN_SHAPE)),
            }
            let high = scalar(text, rest.get(2), op_token)?;
            let tail = rest.get(3..).unwrap_or(&[]);
            (Op::Between, expect_end(text, tail, vec![low, high])?)
        }
        TokenKind::In => (Op::In, value_list(text, rest)?),
        TokenKind::NotIn => (Op::NotIn, value_list(text, rest)?),
        _ => {
            return Err(WeaveError::parse(text, op_token.offset, "expected an operator"));
        }
    };

    Condition::new(field.text.as_str(), op, values)
}

fn is_value(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Str | TokenKind::Number | TokenKind::Ident)
}

/// A single coerced value token.
fn scalar(text: &str, token: Option<&Token>, op: &Token) -> WeaveResult<SqlValue> {
    match token {
        Some(t) if is_value(t.kind) => Ok(coerce_literal(&t.text)),
        Some(t) => Err(WeaveError::parse(text, t.offset, "expected a value")),
        None => Err(WeaveError::parse(
            text,
            op.offset,
            format!("missing value after {}", op.text),
        )),
    }
}

fn expect_end(text: &str, rest: &[Token], values: Vec<SqlValue>) -> WeaveResult<Vec<SqlValue>> {
    match rest.first() {
        None => Ok(values),
        Some(t) => Err(WeaveError::parse(text, t.offset, "unexpected trailing input")),
    }
}

/// `( v [, v]* )`, each value coerced independently.
fn value_list(text: &str, rest: &[Token]) -> WeaveResult<Vec<SqlValue>> {
    let inner = match rest {
        [open, inner @ .., close]
            if open.kind == TokenKind::LParen && close.kind == TokenKind::RParen =>
        {
            inner
        }
        [t, ..] => return Err(WeaveError::parse(text, t.offset, "IN requires (values)")),
        [] => return Err(WeaveError::parse(text, text.len(), "IN requires (values)")),
    };

    inner
        .iter()
        .filter(|t| t.kind != TokenKind::Comma)
        .map(|t| {
            if is_value(t.kind) {
                Ok(coerce_literal(&t.text))
            } else {
                Err(WeaveError::parse(text, t.offset, "expected a list value"))
            }
        })
        .collect()
}
