use crate::classify::confidence::Confidence;
use crate::classify::discrepancy::DiscrepancyInfo;
use crate::classify::evaluator::SkippedRule;
use crate::model::{Action, EmployeeRecord, InputContext, MatchedBy, TransactionRecord};
use serde::{Deserialize, Serialize};

/// Classification of a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// GL account of the matched rule, or `None` when nothing matched.
    pub gl_account: Option<String>,
    /// Display name of the account, as authored on the rule. `None` when
    /// the rule leaves it empty.
    pub gl_account_name: Option<String>,
    /// What to do with the transaction. `REVIEW` when nothing matched.
    pub action: Action,
    pub confidence: Confidence,
    /// Kind of condition that drove the match, `none` when nothing matched.
    pub matched_by: MatchedBy,
    /// Id of the matched rule (`rule-N`).
    pub rule_id: Option<String>,
    /// Notes of the matched rule, if any.
    pub rule_notes: Option<String>,
    /// True if the budget label points at a different account.
    pub has_discrepancy: bool,
    /// Details of the disagreement, when there is one.
    pub discrepancy: Option<DiscrepancyInfo>,
    /// The normalized input the rules were evaluated against.
    pub input_used: InputContext,
    /// Rules that could not be evaluated against this input.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_rules: Vec<SkippedRule>,
}

impl ClassificationResult {
    pub fn is_match(&self) -> bool {
        self.rule_id.is_some()
    }
}

/// One transaction in a batch, with the employee and budget it was
/// charged under.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchItem {
    pub transaction: TransactionRecord,
    pub employee: EmployeeRecord,
    /// Budget label. Falls back to the transaction's `budgetName`.
    #[serde(alias = "billcom_budget")]
    pub budget_label: Option<String>,
}

impl BatchItem {
    pub fn budget_label(&self) -> &str {
        self.budget_label
            .as_deref()
            .or(self.transaction.budget_name.as_deref())
            .unwrap_or_default()
    }
}

/// Batch entry result: the classification plus the identifiers needed to
/// match it back to the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub transaction_id: Option<String>,
    pub budget_label: String,
    #[serde(flatten)]
    pub result: ClassificationResult,
}
