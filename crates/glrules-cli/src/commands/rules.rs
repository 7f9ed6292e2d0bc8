use glrules_core::error::GlRulesError;
use glrules_core::rules::builtin;
use glrules_core::rules::schema::COLUMNS;
use glrules_core::rules::table::DecisionTable;
use std::path::Path;

use crate::output;

pub fn show(file: Option<&Path>) -> Result<(), GlRulesError> {
    let table = super::load_table(file)?;
    output::table::print_rules(&table);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), GlRulesError> {
    let table = glrules_core::rules::load_table(file)?;

    println!("Rule table '{}' is valid.", table.name);
    println!("  Rules: {}", table.len());

    let warnings = shadowed_rules(&table);
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

/// Rules that can never fire because an earlier rule matches everything
/// they match.
fn shadowed_rules(table: &DecisionTable) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut catch_all: Option<&str> = None;

    for (i, rule) in table.rules.iter().enumerate() {
        if let Some(earlier) = catch_all {
            warnings.push(format!(
                "{} is unreachable: {} has no conditions",
                rule.id, earlier
            ));
            continue;
        }

        let conditions = rule.conditions();
        if conditions.is_empty() {
            catch_all = Some(rule.id.as_str());
            continue;
        }

        if let Some(twin) = table.rules[..i]
            .iter()
            .find(|earlier| earlier.conditions() == conditions)
        {
            warnings.push(format!(
                "{} is unreachable: {} has the same conditions",
                rule.id, twin.id
            ));
        }
    }

    warnings
}

pub fn schema() -> Result<(), GlRulesError> {
    print!(
        r#"Rule Sheet Columns
==================

A rule sheet (CSV, or the first worksheet of an XLSX workbook) has a
header row naming these columns:

  {columns}

Rules are evaluated top to bottom and the first rule whose conditions
all hold decides the account. Put specific rules above general ones.

Conditions (an empty cell matches anything):
  merchant_category   MCC code, exact match (e.g. 5541)
  merchant_pattern    Merchant name, case-insensitive. Use * as a wildcard:
                        *USPS*   contains USPS
                        USPS*    starts with USPS
                        *TAXI    ends with TAXI
                        *A*B*    contains A and contains B, in any order
                        AIRBYTE  exactly AIRBYTE
                      A cell starting with # turns the row into a comment.
  amount_min          Inclusive lower bound on the amount
  amount_max          Inclusive upper bound on the amount
  user_team           Cardholder team. Exact (case-sensitive) unless it
                      contains *, then a case-insensitive pattern.
  user_email          Cardholder email, same rules as user_team
  state_match         Exact match

Outputs:
  gl_account          Account number or COGS account name. Rows without
                      one are skipped.
  gl_account_name     Display name
  action              AUTO_POST, REVIEW or REJECT (empty means REVIEW)
  notes               Free text, shown with the result

Example:
  merchant_category,merchant_pattern,amount_min,amount_max,user_team,user_email,state_match,gl_account,gl_account_name,action,notes
  5541,,,,,,,Gas and Tolls,Gas and Tolls,AUTO_POST,MCC 5541 service stations
  ,*USPS*,,,,,,5210,Postal Expenses,AUTO_POST,Postage
  ,*STAPLES*,500,,,,,5239,Office Expenses,REVIEW,Large office supply order

Print a complete sheet to start from with `glrules rules sample`.
Compile a sheet into a decision document with `glrules compile`.
"#,
        columns = COLUMNS.join(", ")
    );
    Ok(())
}

pub fn sample() -> Result<(), GlRulesError> {
    print!("{}", builtin::sample_rules_csv());
    Ok(())
}
