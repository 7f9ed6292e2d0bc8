use crate::model::{InputContext, MatchedBy};
use crate::rules::table::{CompiledRule, DecisionTable, RuleOutputs};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How `matched_by` is derived for the winning rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedByPolicy {
    /// From the conditions the rule actually has: MCC, then merchant, then
    /// anything else.
    #[default]
    Conditions,
    /// From the rule's notes and the input: notes mentioning "mcc", else a
    /// non-empty merchant, else other.
    Notes,
}

impl MatchedByPolicy {
    pub fn derive(&self, rule: &CompiledRule, input: &InputContext) -> MatchedBy {
        match self {
            MatchedByPolicy::Conditions => {
                if rule.mcc.is_some() {
                    MatchedBy::Mcc
                } else if rule.merchant.is_some() {
                    MatchedBy::Merchant
                } else {
                    MatchedBy::Other
                }
            }
            MatchedByPolicy::Notes => {
                if rule.outputs.notes.to_lowercase().contains("mcc") {
                    MatchedBy::Mcc
                } else if !input.merchant().is_empty() {
                    MatchedBy::Merchant
                } else {
                    MatchedBy::Other
                }
            }
        }
    }
}

/// The winning rule of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleHit {
    pub rule_id: String,
    pub outputs: RuleOutputs,
    pub matched_by: MatchedBy,
}

/// A rule that could not be evaluated and was treated as a non-match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRule {
    pub rule_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub hit: Option<RuleHit>,
    /// Rules before the hit (or all rules, on no match) that failed to
    /// evaluate.
    pub skipped: Vec<SkippedRule>,
}

/// Evaluate `input` against `table` with the "first" hit policy.
///
/// Rules are scanned in table order and the scan stops at the first rule
/// whose conditions all hold. A rule whose conditions cannot be evaluated
/// is skipped and the scan goes on.
pub fn evaluate(table: &DecisionTable, input: &InputContext, policy: MatchedByPolicy) -> Evaluation {
    let mut skipped = Vec::new();

    for rule in &table.rules {
        match rule.matches(input) {
            Ok(true) => {
                let matched_by = policy.derive(rule, input);
                debug!(rule = %rule.id, %matched_by, "rule matched");
                return Evaluation {
                    hit: Some(RuleHit {
                        rule_id: rule.id.clone(),
                        outputs: rule.outputs.clone(),
                        matched_by,
                    }),
                    skipped,
                };
            }
            Ok(false) => {}
            Err(e) => {
                warn!(rule = %rule.id, error = %e, "skipping rule that failed to evaluate");
                skipped.push(SkippedRule {
                    rule_id: rule.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    debug!(rules = table.len(), "no rule matched");
    Evaluation { hit: None, skipped }
}
