use crate::error::GlRulesError;
use crate::model::Field;
use crate::rules::expr::{CompareOp, Expression, TextOp};
use rust_decimal::Decimal;
use std::str::FromStr;

pub const WILDCARD: char = '*';

/// Compile a wildcard pattern into a match expression over `field`.
///
/// - `*X*` contains X, `*X` ends with X, `X*` starts with X
/// - several non-empty segments (`*A*B*`) require each segment to be
///   contained somewhere; order and adjacency are not checked
/// - no wildcard is an exact match
///
/// Matching is case-insensitive. Returns `None` when the pattern places no
/// constraint (empty, or wildcards only).
pub fn compile_pattern(pattern: &str, field: Field) -> Option<Expression> {
    let segments: Vec<String> = pattern
        .split(WILDCARD)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_uppercase())
        .collect();

    if segments.is_empty() {
        return None;
    }

    let text = |op: TextOp, needle: String| Expression::Text { field, op, needle };

    if pattern.trim_matches(WILDCARD).contains(WILDCARD) {
        return Some(Expression::All(
            segments
                .into_iter()
                .map(|s| text(TextOp::Contains, s))
                .collect(),
        ));
    }

    let needle = segments.into_iter().next().unwrap_or_default();
    let op = match (pattern.starts_with(WILDCARD), pattern.ends_with(WILDCARD)) {
        (true, true) => TextOp::Contains,
        (true, false) => TextOp::EndsWith,
        (false, true) => TextOp::StartsWith,
        (false, false) => TextOp::Equals,
    };
    Some(text(op, needle))
}

/// Compile inclusive amount bounds into `amount >= min and amount <= max`.
///
/// Either bound may be empty. Returns `None` when both are empty. A bound
/// that is not a decimal number is a configuration error for the rule on
/// `line`.
pub fn compile_amount_range(
    min: &str,
    max: &str,
    line: usize,
) -> Result<Option<Expression>, GlRulesError> {
    let mut bounds = Vec::with_capacity(2);

    for (raw, op, name) in [
        (min, CompareOp::Ge, "amount_min"),
        (max, CompareOp::Le, "amount_max"),
    ] {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let bound = Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .map_err(|_| GlRulesError::InvalidBound {
                line,
                field: name,
                value: raw.to_string(),
            })?;
        bounds.push(Expression::Compare {
            field: Field::Amount,
            op,
            bound,
        });
    }

    Ok(match bounds.len() {
        0 => None,
        1 => bounds.pop(),
        _ => Some(Expression::All(bounds)),
    })
}
