use crate::error::{EvalError, GlRulesError};
use crate::model::{Action, Field, FieldValue, InputContext};
use crate::rules::expr::Expression;
use crate::rules::pattern::{compile_amount_range, compile_pattern, WILDCARD};
use crate::rules::schema::RuleRow;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const HIT_POLICY_FIRST: &str = "first";

/// A compiled condition on a single field.
///
/// `Exact` compares the raw field value for equality (case-sensitive);
/// `Pattern` evaluates a compiled expression. A field with no condition is
/// represented as `None` on the rule and matches any value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Exact(String),
    Pattern(Expression),
}

impl Condition {
    pub fn evaluate(&self, field: Field, input: &InputContext) -> Result<bool, EvalError> {
        match self {
            Condition::Exact(expected) => match input.value(field) {
                FieldValue::Text(actual) => Ok(actual == expected),
                other => Err(EvalError::TypeMismatch {
                    field: field.name(),
                    expected: "text",
                    actual: other.kind(),
                }),
            },
            Condition::Pattern(expr) => expr.evaluate(input),
        }
    }

    fn exact_or_pattern(raw: &str, field: Field) -> Option<Condition> {
        if raw.contains(WILDCARD) {
            compile_pattern(raw, field).map(Condition::Pattern)
        } else if raw.is_empty() {
            None
        } else {
            Some(Condition::Exact(raw.to_string()))
        }
    }
}

/// Outputs carried verbatim from the authored row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutputs {
    pub gl_account: String,
    pub gl_account_name: String,
    pub action: Action,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    /// `rule-N`, assigned in table order starting at 1.
    pub id: String,
    pub mcc: Option<String>,
    pub merchant: Option<Expression>,
    pub amount: Option<Expression>,
    pub user_team: Option<Condition>,
    pub user_email: Option<Condition>,
    pub state_match: Option<String>,
    pub outputs: RuleOutputs,
}

impl CompiledRule {
    /// Conditions that are present on this rule, paired with the field they
    /// are reported under.
    pub fn conditions(&self) -> Vec<(Field, Condition)> {
        let mut out = Vec::new();
        if let Some(ref mcc) = self.mcc {
            out.push((Field::Mcc, Condition::Exact(mcc.clone())));
        }
        if let Some(ref expr) = self.merchant {
            out.push((Field::Merchant, Condition::Pattern(expr.clone())));
        }
        if let Some(ref expr) = self.amount {
            out.push((Field::Amount, Condition::Pattern(expr.clone())));
        }
        if let Some(ref c) = self.user_team {
            out.push((Field::UserTeam, c.clone()));
        }
        if let Some(ref c) = self.user_email {
            out.push((Field::UserEmail, c.clone()));
        }
        if let Some(ref state) = self.state_match {
            out.push((Field::StateMatch, Condition::Exact(state.clone())));
        }
        out
    }

    /// True iff every present condition holds. Conditions are checked in
    /// column order and the first evaluation error fails the rule.
    pub fn matches(&self, input: &InputContext) -> Result<bool, EvalError> {
        if let Some(ref mcc) = self.mcc {
            if input.mcc() != mcc {
                return Ok(false);
            }
        }
        if let Some(ref expr) = self.merchant {
            if !expr.evaluate(input)? {
                return Ok(false);
            }
        }
        if let Some(ref expr) = self.amount {
            if !expr.evaluate(input)? {
                return Ok(false);
            }
        }
        if let Some(ref c) = self.user_team {
            if !c.evaluate(Field::UserTeam, input)? {
                return Ok(false);
            }
        }
        if let Some(ref c) = self.user_email {
            if !c.evaluate(Field::UserEmail, input)? {
                return Ok(false);
            }
        }
        if let Some(ref state) = self.state_match {
            if input.state_match() != state {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Declared input or output column of the decision table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    /// Input field the column reads. Empty for expression columns, which
    /// name their fields inside the expression.
    pub field: String,
}

impl FieldDescriptor {
    fn new(id: &str, name: &str, field: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            field: field.to_string(),
        }
    }
}

pub fn input_descriptors() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("mcc", "MCC Code", "mcc"),
        FieldDescriptor::new("merchant_expr", "Merchant Match", ""),
        FieldDescriptor::new("amount_expr", "Amount Range", ""),
        FieldDescriptor::new("user_team", "User Team", "user_team"),
        FieldDescriptor::new("user_team_expr", "User Team Match", ""),
        FieldDescriptor::new("user_email", "User Email", "user_email"),
        FieldDescriptor::new("user_email_expr", "User Email Match", ""),
        FieldDescriptor::new("state_match", "State Match", "state_match"),
    ]
}

pub fn output_descriptors() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("gl_account", "GL Account", "gl_account"),
        FieldDescriptor::new("gl_account_name", "Account Name", "gl_account_name"),
        FieldDescriptor::new("action", "Action", "action"),
        FieldDescriptor::new("notes", "Notes", "notes"),
    ]
}

/// Ordered, immutable rule table evaluated with the "first" hit policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTable {
    pub name: String,
    pub inputs: Vec<FieldDescriptor>,
    pub outputs: Vec<FieldDescriptor>,
    pub rules: Vec<CompiledRule>,
}

impl DecisionTable {
    pub fn new(rules: Vec<CompiledRule>) -> Self {
        Self {
            name: "Classify Transaction".to_string(),
            inputs: input_descriptors(),
            outputs: output_descriptors(),
            rules,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Compile authored rows into a decision table.
///
/// Comment rows, blank rows and rows without a GL account are dropped and
/// take no rule id. Surviving rows keep their relative order.
pub fn build_table(rows: &[RuleRow]) -> Result<DecisionTable, GlRulesError> {
    let mut rules = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for row in rows {
        if row.is_comment() || row.is_blank() {
            skipped += 1;
            continue;
        }
        if row.gl_account.trim().is_empty() {
            warn!(line = row.line, "rule row has no gl_account, skipping");
            skipped += 1;
            continue;
        }
        let id = format!("rule-{}", rules.len() + 1);
        rules.push(compile_row(row, id)?);
    }

    debug!(
        compiled = rules.len(),
        skipped, "built decision table from authored rows"
    );

    Ok(DecisionTable::new(rules))
}

fn compile_row(row: &RuleRow, id: String) -> Result<CompiledRule, GlRulesError> {
    let action_raw = row.action.trim();
    let action = if action_raw.is_empty() {
        Action::Review
    } else {
        Action::parse(action_raw).ok_or_else(|| GlRulesError::InvalidAction {
            line: row.line,
            value: action_raw.to_string(),
        })?
    };

    Ok(CompiledRule {
        id,
        mcc: non_empty(&row.merchant_category),
        merchant: compile_pattern(row.merchant_pattern.trim(), Field::Merchant),
        amount: compile_amount_range(&row.amount_min, &row.amount_max, row.line)?,
        user_team: Condition::exact_or_pattern(row.user_team.trim(), Field::UserTeam),
        user_email: Condition::exact_or_pattern(row.user_email.trim(), Field::UserEmail),
        state_match: non_empty(&row.state_match),
        outputs: RuleOutputs {
            gl_account: row.gl_account.trim().to_string(),
            gl_account_name: row.gl_account_name.trim().to_string(),
            action,
            notes: row.notes.trim().to_string(),
        },
    })
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
