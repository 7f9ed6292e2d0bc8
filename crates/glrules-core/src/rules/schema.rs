use serde::{Deserialize, Serialize};

/// Marker that turns an authoring row into a comment when it starts the
/// merchant pattern.
pub const COMMENT_MARKER: char = '#';

/// Column names of the rule authoring format, in order.
pub const COLUMNS: [&str; 11] = [
    "merchant_category",
    "merchant_pattern",
    "amount_min",
    "amount_max",
    "user_team",
    "user_email",
    "state_match",
    "gl_account",
    "gl_account_name",
    "action",
    "notes",
];

/// One authored rule, exactly as written in the rules sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleRow {
    /// MCC code, exact match. Empty matches any MCC.
    pub merchant_category: String,
    /// Merchant name, exact or with `*` wildcards.
    pub merchant_pattern: String,
    /// Inclusive lower bound on the amount.
    pub amount_min: String,
    /// Inclusive upper bound on the amount.
    pub amount_max: String,
    pub user_team: String,
    pub user_email: String,
    pub state_match: String,
    pub gl_account: String,
    pub gl_account_name: String,
    /// AUTO_POST, REVIEW or REJECT. Empty means REVIEW.
    pub action: String,
    pub notes: String,
    /// 1-based line in the source sheet, for error messages.
    #[serde(skip)]
    pub line: usize,
}

impl RuleRow {
    pub fn is_comment(&self) -> bool {
        self.merchant_pattern
            .trim_start()
            .starts_with(COMMENT_MARKER)
    }

    pub fn is_blank(&self) -> bool {
        [
            &self.merchant_category,
            &self.merchant_pattern,
            &self.amount_min,
            &self.amount_max,
            &self.user_team,
            &self.user_email,
            &self.state_match,
            &self.gl_account,
            &self.gl_account_name,
            &self.action,
            &self.notes,
        ]
        .iter()
        .all(|v| v.trim().is_empty())
    }

    /// Set a column by its authoring name. Unknown columns are ignored.
    pub fn set(&mut self, column: &str, value: String) {
        match column {
            "merchant_category" => self.merchant_category = value,
            "merchant_pattern" => self.merchant_pattern = value,
            "amount_min" => self.amount_min = value,
            "amount_max" => self.amount_max = value,
            "user_team" => self.user_team = value,
            "user_email" => self.user_email = value,
            "state_match" => self.state_match = value,
            "gl_account" => self.gl_account = value,
            "gl_account_name" => self.gl_account_name = value,
            "action" => self.action = value,
            "notes" => self.notes = value,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_detection() {
        let row = RuleRow {
            merchant_pattern: "# --- Fuel ---".into(),
            ..Default::default()
        };
        assert!(row.is_comment());
        assert!(!row.is_blank());
    }

    #[test]
    fn test_blank_detection() {
        let row = RuleRow {
            notes: "   ".into(),
            line: 7,
            ..Default::default()
        };
        assert!(row.is_blank());
    }

    #[test]
    fn test_set_by_column_name() {
        let mut row = RuleRow::default();
        for column in COLUMNS {
            row.set(column, column.to_uppercase());
        }
        row.set("unknown", "x".into());
        assert_eq!(row.merchant_category, "MERCHANT_CATEGORY");
        assert_eq!(row.notes, "NOTES");
    }
}
