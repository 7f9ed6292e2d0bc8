use crate::model::{Action, MatchedBy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far a classification can be trusted without a human look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Reject,
}

impl Confidence {
    /// Derive the tier from the action, what matched, and whether the
    /// budget disagrees.
    ///
    /// An MCC match stays `High` even when the budget disagrees.
    pub fn assess(action: Action, matched_by: MatchedBy, has_discrepancy: bool) -> Confidence {
        if action == Action::Reject {
            return Confidence::Reject;
        }
        match (matched_by, has_discrepancy) {
            (MatchedBy::Mcc, _) => Confidence::High,
            (MatchedBy::Merchant, false) => Confidence::High,
            (MatchedBy::Merchant, true) => Confidence::Medium,
            (MatchedBy::Other | MatchedBy::Unmatched, false) => Confidence::Medium,
            (MatchedBy::Other | MatchedBy::Unmatched, true) => Confidence::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
            Confidence::Reject => "REJECT",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
