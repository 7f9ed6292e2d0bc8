use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GlRulesError {
    #[error("rule on line {line}: invalid {field} '{value}' (expected a decimal number)")]
    InvalidBound {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("rule on line {line}: unknown action '{value}' (expected AUTO_POST, REVIEW or REJECT)")]
    InvalidAction { line: usize, value: String },

    #[error("invalid expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("invalid rule table: {0}")]
    RuleInvalid(String),

    #[error("failed to load rules from {path}: {reason}")]
    RuleLoad { path: PathBuf, reason: String },

    #[error("failed to load budget map from {path}: {reason}")]
    BudgetMapLoad { path: PathBuf, reason: String },

    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A single rule that could not be evaluated against an input.
///
/// Never escapes the evaluator: the rule is treated as a non-match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("'{field}' is {actual}, expected {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}
