use glrules_core::classify::outcome::{BatchItemResult, ClassificationResult};
use glrules_core::model::Field;
use glrules_core::rules::table::{Condition, DecisionTable};

pub fn print_result(result: &ClassificationResult) {
    match (&result.gl_account, &result.rule_id) {
        (Some(account), Some(rule_id)) => {
            let name = result.gl_account_name.as_deref().unwrap_or("");
            if name.is_empty() || name == account {
                println!("  Account:     {account}");
            } else {
                println!("  Account:     {account} ({name})");
            }
            println!("  Rule:        {rule_id} (matched by {})", result.matched_by);
        }
        _ => println!("  Account:     - (no rule matched)"),
    }
    println!("  Action:      {}", result.action);
    println!("  Confidence:  {}", result.confidence);

    if let Some(notes) = result.rule_notes.as_deref().filter(|n| !n.is_empty()) {
        println!("  Notes:       {notes}");
    }
    if let Some(ref d) = result.discrepancy {
        println!("  Discrepancy: {}", d.reason);
    }
    for skipped in &result.skipped_rules {
        println!("  Skipped:     {} ({})", skipped.rule_id, skipped.reason);
    }
}

pub fn print_batch(results: &[BatchItemResult]) {
    let id_width = results
        .iter()
        .map(|r| r.transaction_id.as_deref().unwrap_or("-").len())
        .max()
        .unwrap_or(2)
        .max("Transaction".len());
    let account_width = results
        .iter()
        .map(|r| r.result.gl_account.as_deref().unwrap_or("-").len())
        .max()
        .unwrap_or(7)
        .max("Account".len());

    println!(
        "  {:<id_width$}  {:<account_width$}  {:<9}  {:<10}  {:<8}  Budget",
        "Transaction", "Account", "Action", "Confidence", "Matched"
    );
    println!(
        "  {}",
        "-".repeat(id_width + account_width + 9 + 10 + 8 + 6 + 10 + 6)
    );

    for r in results {
        let flag = if r.result.has_discrepancy { " (!)" } else { "" };
        println!(
            "  {:<id_width$}  {:<account_width$}  {:<9}  {:<10}  {:<8}  {}{}",
            r.transaction_id.as_deref().unwrap_or("-"),
            r.result.gl_account.as_deref().unwrap_or("-"),
            r.result.action.as_str(),
            r.result.confidence.as_str(),
            r.result.matched_by.as_str(),
            r.budget_label,
            flag
        );
    }

    let matched = results.iter().filter(|r| r.result.is_match()).count();
    let discrepancies = results.iter().filter(|r| r.result.has_discrepancy).count();
    println!();
    println!(
        "  {} transactions, {} matched, {} with budget discrepancies",
        results.len(),
        matched,
        discrepancies
    );
}

pub fn print_rules(table: &DecisionTable) {
    println!("=== {} ({} rules, first hit) ===\n", table.name, table.len());

    for rule in &table.rules {
        let conditions: Vec<String> = rule
            .conditions()
            .iter()
            .map(|(field, condition)| describe(*field, condition))
            .collect();
        let when = if conditions.is_empty() {
            "always".to_string()
        } else {
            conditions.join(" and ")
        };

        println!(
            "  {:<8} {} -> {} [{}]",
            rule.id, when, rule.outputs.gl_account, rule.outputs.action
        );
        if !rule.outputs.notes.is_empty() {
            println!("           {}", rule.outputs.notes);
        }
    }
    println!();
}

fn describe(field: Field, condition: &Condition) -> String {
    match condition {
        Condition::Exact(value) => format!("{field} == \"{value}\""),
        Condition::Pattern(expr) => expr.to_string(),
    }
}
