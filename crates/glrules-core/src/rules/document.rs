//! The compiled decision document.
//!
//! A JSON graph of one input node, one decision-table node and one output
//! node. Rule cells holding literal values are stored quoted (`"\"5541\""`),
//! expression cells are stored as plain expression text, and unset cells
//! are empty strings.

use crate::error::GlRulesError;
use crate::model::Action;
use crate::rules::expr::Expression;
use crate::rules::table::{
    CompiledRule, Condition, DecisionTable, FieldDescriptor, RuleOutputs, HIT_POLICY_FIRST,
};
use serde::{Deserialize, Serialize};

pub const CONTENT_TYPE: &str = "application/vnd.gorules.decision";

const INPUT_NODE: &str = "inputNode";
const DECISION_TABLE_NODE: &str = "decisionTableNode";
const OUTPUT_NODE: &str = "outputNode";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionDocument {
    pub content_type: String,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<TableContent>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableContent {
    pub hit_policy: String,
    pub inputs: Vec<FieldDescriptor>,
    pub outputs: Vec<FieldDescriptor>,
    pub rules: Vec<RuleCells>,
}

/// One rule row of the decision-table node, as stored in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleCells {
    #[serde(rename = "_id")]
    pub id: String,
    pub mcc: String,
    pub merchant_expr: String,
    pub amount_expr: String,
    pub user_team: String,
    pub user_team_expr: String,
    pub user_email: String,
    pub user_email_expr: String,
    pub state_match: String,
    pub gl_account: String,
    pub gl_account_name: String,
    pub action: String,
    pub notes: String,
}

/// Render a compiled table as a decision document.
pub fn to_document(table: &DecisionTable) -> DecisionDocument {
    let rules = table.rules.iter().map(rule_to_cells).collect();

    DecisionDocument {
        content_type: CONTENT_TYPE.to_string(),
        nodes: vec![
            Node {
                id: "input".into(),
                kind: INPUT_NODE.into(),
                name: "Request".into(),
                position: Position { x: 0, y: 0 },
                content: None,
            },
            Node {
                id: "classify-transaction".into(),
                kind: DECISION_TABLE_NODE.into(),
                name: table.name.clone(),
                position: Position { x: 300, y: 0 },
                content: Some(TableContent {
                    hit_policy: HIT_POLICY_FIRST.into(),
                    inputs: table.inputs.clone(),
                    outputs: table.outputs.clone(),
                    rules,
                }),
            },
            Node {
                id: "output".into(),
                kind: OUTPUT_NODE.into(),
                name: "Response".into(),
                position: Position { x: 600, y: 0 },
                content: None,
            },
        ],
        edges: vec![
            Edge {
                id: "edge-1".into(),
                source_id: "input".into(),
                target_id: "classify-transaction".into(),
            },
            Edge {
                id: "edge-2".into(),
                source_id: "classify-transaction".into(),
                target_id: "output".into(),
            },
        ],
    }
}

fn rule_to_cells(rule: &CompiledRule) -> RuleCells {
    let (user_team, user_team_expr) = split_condition(rule.user_team.as_ref());
    let (user_email, user_email_expr) = split_condition(rule.user_email.as_ref());

    RuleCells {
        id: rule.id.clone(),
        mcc: rule.mcc.as_deref().map(quote).unwrap_or_default(),
        merchant_expr: expr_cell(rule.merchant.as_ref()),
        amount_expr: expr_cell(rule.amount.as_ref()),
        user_team,
        user_team_expr,
        user_email,
        user_email_expr,
        state_match: rule.state_match.as_deref().map(quote).unwrap_or_default(),
        gl_account: quote(&rule.outputs.gl_account),
        gl_account_name: quote(&rule.outputs.gl_account_name),
        action: quote(rule.outputs.action.as_str()),
        notes: quote(&rule.outputs.notes),
    }
}

fn split_condition(condition: Option<&Condition>) -> (String, String) {
    match condition {
        Some(Condition::Exact(value)) => (quote(value), String::new()),
        Some(Condition::Pattern(expr)) => (String::new(), expr.to_string()),
        None => (String::new(), String::new()),
    }
}

fn expr_cell(expr: Option<&Expression>) -> String {
    expr.map(|e| e.to_string()).unwrap_or_default()
}

fn quote(value: &str) -> String {
    format!("\"{value}\"")
}

/// Load a compiled table from a decision document.
///
/// The document must contain exactly one decision-table node and it must
/// use the "first" hit policy. Rule order is taken from the document.
pub fn from_document(doc: &DecisionDocument) -> Result<DecisionTable, GlRulesError> {
    if doc.content_type != CONTENT_TYPE {
        return Err(GlRulesError::RuleInvalid(format!(
            "unsupported content type '{}' (expected '{CONTENT_TYPE}')",
            doc.content_type
        )));
    }

    let tables: Vec<&Node> = doc
        .nodes
        .iter()
        .filter(|n| n.kind == DECISION_TABLE_NODE)
        .collect();
    let node = match tables.as_slice() {
        [node] => *node,
        _ => {
            return Err(GlRulesError::RuleInvalid(format!(
                "expected exactly one {DECISION_TABLE_NODE}, found {}",
                tables.len()
            )))
        }
    };
    for kind in [INPUT_NODE, OUTPUT_NODE] {
        if !doc.nodes.iter().any(|n| n.kind == kind) {
            return Err(GlRulesError::RuleInvalid(format!("document has no {kind}")));
        }
    }

    let content = node.content.as_ref().ok_or_else(|| {
        GlRulesError::RuleInvalid(format!("decision table node '{}' has no content", node.id))
    })?;
    if content.hit_policy != HIT_POLICY_FIRST {
        return Err(GlRulesError::RuleInvalid(format!(
            "unsupported hit policy '{}' (only '{HIT_POLICY_FIRST}' is supported)",
            content.hit_policy
        )));
    }

    let rules = content
        .rules
        .iter()
        .map(cells_to_rule)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecisionTable {
        name: node.name.clone(),
        inputs: content.inputs.clone(),
        outputs: content.outputs.clone(),
        rules,
    })
}

fn cells_to_rule(cells: &RuleCells) -> Result<CompiledRule, GlRulesError> {
    let action_raw = unquote(&cells.id, "action", &cells.action)?;
    let action = match action_raw.as_deref() {
        None => Action::Review,
        Some(raw) => Action::parse(raw).ok_or_else(|| {
            GlRulesError::RuleInvalid(format!("{}: unknown action '{raw}'", cells.id))
        })?,
    };

    let gl_account = unquote(&cells.id, "gl_account", &cells.gl_account)?.unwrap_or_default();
    if gl_account.is_empty() {
        return Err(GlRulesError::RuleInvalid(format!(
            "{}: gl_account must not be empty",
            cells.id
        )));
    }

    Ok(CompiledRule {
        id: cells.id.clone(),
        mcc: unquote(&cells.id, "mcc", &cells.mcc)?,
        merchant: parse_expr(&cells.merchant_expr)?,
        amount: parse_expr(&cells.amount_expr)?,
        user_team: join_condition(&cells.id, "user_team", &cells.user_team, &cells.user_team_expr)?,
        user_email: join_condition(
            &cells.id,
            "user_email",
            &cells.user_email,
            &cells.user_email_expr,
        )?,
        state_match: unquote(&cells.id, "state_match", &cells.state_match)?,
        outputs: RuleOutputs {
            gl_account,
            gl_account_name: unquote(&cells.id, "gl_account_name", &cells.gl_account_name)?
                .unwrap_or_default(),
            action,
            notes: unquote(&cells.id, "notes", &cells.notes)?.unwrap_or_default(),
        },
    })
}

fn join_condition(
    rule_id: &str,
    column: &str,
    exact: &str,
    expr: &str,
) -> Result<Option<Condition>, GlRulesError> {
    let exact = unquote(rule_id, column, exact)?;
    let pattern = parse_expr(expr)?;
    match (exact, pattern) {
        (Some(_), Some(_)) => Err(GlRulesError::RuleInvalid(format!(
            "{rule_id}: both '{column}' and '{column}_expr' are set"
        ))),
        (Some(value), None) => Ok(Some(Condition::Exact(value))),
        (None, Some(expr)) => Ok(Some(Condition::Pattern(expr))),
        (None, None) => Ok(None),
    }
}

/// Empty cells are unset; anything else must be a quoted literal.
fn unquote(rule_id: &str, column: &str, cell: &str) -> Result<Option<String>, GlRulesError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    match cell
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) if inner.is_empty() => Ok(None),
        Some(inner) => Ok(Some(inner.to_string())),
        None => Err(GlRulesError::RuleInvalid(format!(
            "{rule_id}: '{column}' must be a quoted value, got {cell}"
        ))),
    }
}

fn parse_expr(cell: &str) -> Result<Option<Expression>, GlRulesError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    Expression::parse(cell).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::schema::RuleRow;
    use crate::rules::table::build_table;

    fn sample_table() -> DecisionTable {
        let rows = vec![
            RuleRow {
                merchant_category: "5541".into(),
                gl_account: "Gas and Tolls".into(),
                action: "AUTO_POST".into(),
                notes: "MCC 5541 fuel".into(),
                line: 2,
                ..Default::default()
            },
            RuleRow {
                merchant_pattern: "*USPS*".into(),
                amount_min: "0".into(),
                amount_max: "100".into(),
                user_team: "*Admin*".into(),
                user_email: "g@example.com".into(),
                gl_account: "5210".into(),
                gl_account_name: "Postal Expenses".into(),
                line: 3,
                ..Default::default()
            },
        ];
        build_table(&rows).unwrap()
    }

    #[test]
    fn test_document_shape() {
        let doc = to_document(&sample_table());
        assert_eq!(doc.content_type, CONTENT_TYPE);
        let kinds: Vec<&str> = doc.nodes.iter().map(|n| n.kind.as_str()).collect();
        assert_eq!(kinds, vec![INPUT_NODE, DECISION_TABLE_NODE, OUTPUT_NODE]);
        assert_eq!(doc.edges.len(), 2);

        let content = doc.nodes[1].content.as_ref().unwrap();
        assert_eq!(content.hit_policy, "first");
        let first = &content.rules[0];
        assert_eq!(first.id, "rule-1");
        assert_eq!(first.mcc, "\"5541\"");
        assert_eq!(first.merchant_expr, "");
        assert_eq!(first.action, "\"AUTO_POST\"");

        let second = &content.rules[1];
        assert_eq!(second.merchant_expr, r#"contains(upper(merchant), "USPS")"#);
        assert_eq!(second.amount_expr, "(amount >= 0) and (amount <= 100)");
        assert_eq!(second.user_team, "");
        assert_eq!(second.user_team_expr, r#"contains(upper(user_team), "ADMIN")"#);
        assert_eq!(second.user_email, "\"g@example.com\"");
        assert_eq!(second.user_email_expr, "");
        assert_eq!(second.action, "\"REVIEW\"");
    }

    #[test]
    fn test_document_serializes_camel_case() {
        let json = serde_json::to_value(to_document(&sample_table())).unwrap();
        assert_eq!(json["contentType"], CONTENT_TYPE);
        assert_eq!(json["nodes"][1]["type"], DECISION_TABLE_NODE);
        assert_eq!(json["nodes"][1]["content"]["hitPolicy"], "first");
        assert_eq!(json["nodes"][1]["content"]["rules"][0]["_id"], "rule-1");
        assert_eq!(json["edges"][0]["sourceId"], "input");
    }

    #[test]
    fn test_load_restores_table() {
        let table = sample_table();
        let json = serde_json::to_string(&to_document(&table)).unwrap();
        let doc: DecisionDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(from_document(&doc).unwrap(), table);
    }

    #[test]
    fn test_load_rejects_other_hit_policy() {
        let mut doc = to_document(&sample_table());
        doc.nodes[1].content.as_mut().unwrap().hit_policy = "collect".into();
        assert!(from_document(&doc).is_err());
    }

    #[test]
    fn test_load_rejects_two_tables() {
        let mut doc = to_document(&sample_table());
        let extra = doc.nodes[1].clone();
        doc.nodes.push(extra);
        assert!(from_document(&doc).is_err());
    }

    #[test]
    fn test_load_rejects_both_team_representations() {
        let mut doc = to_document(&sample_table());
        let rules = &mut doc.nodes[1].content.as_mut().unwrap().rules;
        rules[1].user_team = "\"Admin\"".into();
        let err = from_document(&doc).unwrap_err();
        assert!(err.to_string().contains("user_team"));
    }

    #[test]
    fn test_load_rejects_unquoted_literal() {
        let mut doc = to_document(&sample_table());
        doc.nodes[1].content.as_mut().unwrap().rules[0].mcc = "5541".into();
        assert!(from_document(&doc).is_err());
    }

    #[test]
    fn test_load_rejects_bad_expression() {
        let mut doc = to_document(&sample_table());
        doc.nodes[1].content.as_mut().unwrap().rules[1].merchant_expr =
            "matches(merchant, \"USPS\")".into();
        assert!(matches!(
            from_document(&doc),
            Err(GlRulesError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_empty_action_cell_defaults_to_review() {
        let mut doc = to_document(&sample_table());
        doc.nodes[1].content.as_mut().unwrap().rules[0].action = String::new();
        let table = from_document(&doc).unwrap();
        assert_eq!(table.rules[0].outputs.action, Action::Review);
    }
}
