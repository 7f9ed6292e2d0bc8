use crate::error::GlRulesError;
use crate::rules::table::DecisionTable;
use crate::rules::{parse_table, RuleFormat};

const SAMPLE_RULES_CSV: &str = include_str!("../../../../data/classification_rules.csv");

/// The embedded sample rule sheet, as authored.
pub fn sample_rules_csv() -> &'static str {
    SAMPLE_RULES_CSV
}

/// Compile the embedded sample rule sheet.
pub fn default_table() -> Result<DecisionTable, GlRulesError> {
    parse_table(SAMPLE_RULES_CSV.as_bytes(), RuleFormat::Csv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, Field};

    #[test]
    fn test_default_table_compiles() {
        let table = default_table().unwrap();
        assert!(!table.is_empty());
        assert_eq!(table.rules[0].id, "rule-1");
    }

    #[test]
    fn test_comment_rows_take_no_id() {
        let table = default_table().unwrap();
        let ids: Vec<usize> = table
            .rules
            .iter()
            .map(|r| r.id.trim_start_matches("rule-").parse().unwrap())
            .collect();
        let expected: Vec<usize> = (1..=table.len()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_fuel_mcc_rule_precedes_posting_merchant_rules() {
        let table = default_table().unwrap();
        let fuel = table
            .rules
            .iter()
            .position(|r| r.mcc.as_deref() == Some("5541"))
            .unwrap();
        let first_merchant = table
            .rules
            .iter()
            .position(|r| {
                r.merchant.is_some() && r.mcc.is_none() && r.outputs.action != Action::Reject
            })
            .unwrap();
        assert!(fuel < first_merchant);
        assert_eq!(table.rules[fuel].outputs.gl_account, "Gas and Tolls");
        assert_eq!(table.rules[fuel].outputs.action, Action::AutoPost);
    }

    #[test]
    fn test_reject_rules_come_first() {
        let table = default_table().unwrap();
        let last_reject = table
            .rules
            .iter()
            .rposition(|r| r.outputs.action == Action::Reject)
            .unwrap();
        assert!(table.rules[..=last_reject]
            .iter()
            .all(|r| r.outputs.action == Action::Reject));
    }

    #[test]
    fn test_sample_source_is_the_authored_sheet() {
        let first = sample_rules_csv().lines().next().unwrap();
        assert!(first.starts_with("merchant_category,merchant_pattern"));
    }

    #[test]
    fn test_sample_has_reject_rule() {
        let table = default_table().unwrap();
        assert!(table
            .rules
            .iter()
            .any(|r| r.outputs.action == Action::Reject));
    }

    #[test]
    fn test_sample_uses_every_condition_kind() {
        let table = default_table().unwrap();
        for field in [Field::Mcc, Field::Merchant, Field::Amount, Field::UserTeam, Field::UserEmail] {
            assert!(
                table
                    .rules
                    .iter()
                    .any(|r| r.conditions().iter().any(|(f, _)| *f == field)),
                "no sample rule constrains {field}"
            );
        }
    }
}
