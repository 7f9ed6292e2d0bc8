pub mod accounts;
pub mod classify;
pub mod error;
pub mod model;
pub mod rules;

use accounts::AccountResolver;
use classify::evaluator::{self, MatchedByPolicy};
use classify::outcome::{BatchItem, BatchItemResult, ClassificationResult};
use classify::{discrepancy, Confidence};
use model::{Action, EmployeeRecord, InputContext, MatchedBy, TransactionRecord};
use rules::table::DecisionTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Options for classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyOptions {
    /// How `matched_by` is derived for the winning rule.
    pub matched_by: MatchedByPolicy,
}

/// Main API entry point: a compiled rule table plus the budget resolver,
/// built once and shared across any number of classifications.
pub struct Classifier {
    table: DecisionTable,
    resolver: Box<dyn AccountResolver>,
    options: ClassifyOptions,
}

impl Classifier {
    pub fn new(
        table: DecisionTable,
        resolver: Box<dyn AccountResolver>,
        options: ClassifyOptions,
    ) -> Self {
        Self {
            table,
            resolver,
            options,
        }
    }

    pub fn table(&self) -> &DecisionTable {
        &self.table
    }

    /// Classify one normalized input against the table and cross-check the
    /// result against `budget_label` (empty when there is none).
    pub fn classify(&self, input: &InputContext, budget_label: &str) -> ClassificationResult {
        let evaluation = evaluator::evaluate(&self.table, input, self.options.matched_by);

        let Some(hit) = evaluation.hit else {
            debug!(merchant = input.merchant(), "no rule matched, sending to review");
            return ClassificationResult {
                gl_account: None,
                gl_account_name: None,
                action: Action::Review,
                confidence: Confidence::assess(Action::Review, MatchedBy::Unmatched, false),
                matched_by: MatchedBy::Unmatched,
                rule_id: None,
                rule_notes: None,
                has_discrepancy: false,
                discrepancy: None,
                input_used: input.clone(),
                skipped_rules: evaluation.skipped,
            };
        };

        let discrepancy = discrepancy::detect(
            self.resolver.as_ref(),
            budget_label,
            &hit.outputs.gl_account,
            hit.matched_by,
        );
        let has_discrepancy = discrepancy.is_some();
        let confidence = Confidence::assess(hit.outputs.action, hit.matched_by, has_discrepancy);

        ClassificationResult {
            gl_account: Some(hit.outputs.gl_account),
            gl_account_name: non_empty(hit.outputs.gl_account_name),
            action: hit.outputs.action,
            confidence,
            matched_by: hit.matched_by,
            rule_id: Some(hit.rule_id),
            rule_notes: non_empty(hit.outputs.notes),
            has_discrepancy,
            discrepancy,
            input_used: input.clone(),
            skipped_rules: evaluation.skipped,
        }
    }

    /// Classify raw transaction and employee records.
    pub fn classify_records(
        &self,
        transaction: &TransactionRecord,
        employee: &EmployeeRecord,
        budget_label: &str,
    ) -> ClassificationResult {
        let input = InputContext::from_records(transaction, employee);
        self.classify(&input, budget_label)
    }

    /// Classify a batch in order, one result per item.
    pub fn classify_batch(&self, items: &[BatchItem]) -> Vec<BatchItemResult> {
        let results: Vec<BatchItemResult> = items
            .iter()
            .map(|item| {
                let budget_label = item.budget_label();
                BatchItemResult {
                    transaction_id: item.transaction.transaction_id().map(str::to_string),
                    budget_label: budget_label.to_string(),
                    result: self.classify_records(&item.transaction, &item.employee, budget_label),
                }
            })
            .collect();

        debug!(
            items = results.len(),
            matched = results.iter().filter(|r| r.result.is_match()).count(),
            discrepancies = results.iter().filter(|r| r.result.has_discrepancy).count(),
            "classified batch"
        );
        results
    }
}

fn non_empty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.is_empty())
}
