use crate::accounts::AccountResolver;
use crate::model::MatchedBy;
use serde::{Deserialize, Serialize};

/// Disagreement between the budget the cardholder picked and the rule
/// that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyInfo {
    /// Budget label as received.
    pub budget_label: String,
    /// Account of the matched rule as authored.
    pub rule_account: String,
    /// Account the budget label resolves to.
    pub budget_account: String,
    /// Rule account after resolution.
    pub resolved_rule_account: String,
    pub matched_by: MatchedBy,
    pub reason: String,
}

/// Compare the budget's account with the rule's account.
///
/// Returns `None` when the budget label does not resolve, when there is no
/// rule account, or when both resolve to the same account. A rule account
/// that is itself a known label is resolved first, so "5216" and
/// "5216 - Travel Expenses" agree.
pub fn detect(
    resolver: &dyn AccountResolver,
    budget_label: &str,
    rule_account: &str,
    matched_by: MatchedBy,
) -> Option<DiscrepancyInfo> {
    let budget_account = resolver.resolve(budget_label)?;

    let rule_account = rule_account.trim();
    if rule_account.is_empty() || budget_account.is_empty() {
        return None;
    }
    let resolved_rule_account = resolver
        .lookup(rule_account)
        .unwrap_or_else(|| rule_account.to_string());

    if resolved_rule_account == budget_account {
        return None;
    }

    let budget_label = budget_label.trim();
    Some(DiscrepancyInfo {
        reason: format!(
            "Budget '{budget_label}' suggests account {budget_account}, but {} indicates {resolved_rule_account}",
            matched_by.as_str().to_uppercase()
        ),
        budget_label: budget_label.to_string(),
        rule_account: rule_account.to_string(),
        budget_account,
        resolved_rule_account,
        matched_by,
    })
}
