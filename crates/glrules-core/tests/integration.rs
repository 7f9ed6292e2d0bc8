//! Integration tests for the Classifier end-to-end pipeline.
//!
//! Rule tables are built from authoring CSV text (or loaded from temp
//! files), and budget resolution uses either the embedded map or a small
//! in-memory resolver.

use std::collections::HashMap;
use std::io::Write;

use glrules_core::accounts::{AccountResolver, BudgetAccountMap};
use glrules_core::classify::{Confidence, MatchedByPolicy};
use glrules_core::error::GlRulesError;
use glrules_core::model::{Action, Amount, EvaluationRequest, InputContext, MatchedBy};
use glrules_core::rules::builtin::default_table;
use glrules_core::rules::table::DecisionTable;
use glrules_core::rules::{load_table, parse_table, write_document, RuleFormat};
use glrules_core::{Classifier, ClassifyOptions};

const HEADER: &str = "merchant_category,merchant_pattern,amount_min,amount_max,user_team,user_email,state_match,gl_account,gl_account_name,action,notes";

struct StaticResolver {
    labels: HashMap<&'static str, &'static str>,
}

impl AccountResolver for StaticResolver {
    fn lookup(&self, label: &str) -> Option<String> {
        self.labels.get(label).map(|s| s.to_string())
    }
}

fn static_resolver() -> Box<StaticResolver> {
    Box::new(StaticResolver {
        labels: HashMap::from([
            ("5216 - Travel Expenses", "5216"),
            ("5210 - Postal Expenses", "5210"),
            ("Delivery Cost - Gas Tolls Fines", "Gas and Tolls"),
        ]),
    })
}

fn table(rows: &[&str]) -> DecisionTable {
    let csv = format!("{HEADER}\n{}\n", rows.join("\n"));
    parse_table(csv.as_bytes(), RuleFormat::Csv).unwrap()
}

fn input(mcc: &str, merchant: &str, amount: f64) -> InputContext {
    EvaluationRequest {
        mcc: mcc.into(),
        merchant: merchant.into(),
        amount: Amount::from_f64(amount),
        ..Default::default()
    }
    .into()
}

fn sample_classifier() -> Classifier {
    Classifier::new(
        default_table().unwrap(),
        Box::new(BudgetAccountMap::embedded().unwrap()),
        ClassifyOptions::default(),
    )
}

// ---------------------------------------------------------------------------
// Test 1: Fuel purchase charged to a truck maintenance budget
// ---------------------------------------------------------------------------
#[test]
fn mcc_rule_fires_for_fuel_purchase() {
    let result = sample_classifier().classify(
        &input("5541", "GULF OIL 91429455", 59.0),
        "Maintenance - Trucks",
    );

    assert_eq!(result.gl_account.as_deref(), Some("Gas and Tolls"));
    assert_eq!(result.action, Action::AutoPost);
    assert_eq!(result.matched_by, MatchedBy::Mcc);
    assert_eq!(result.confidence, Confidence::High);
    assert!(result.has_discrepancy);

    let info = result.discrepancy.unwrap();
    assert_eq!(info.budget_label, "Maintenance - Trucks");
    assert_eq!(info.budget_account, "Routine Maintenance on Trucks");
    assert_eq!(info.resolved_rule_account, "Gas and Tolls");
    assert_eq!(info.matched_by, MatchedBy::Mcc);
}

// ---------------------------------------------------------------------------
// Test 2: An earlier specific rule beats a later catch-all
// ---------------------------------------------------------------------------
#[test]
fn first_matching_rule_wins() {
    let table = table(&[
        "5541,,,,,,,Gas and Tolls,Gas and Tolls,AUTO_POST,MCC fuel",
        ",*,,,,,,5239,Office Expenses,REVIEW,catch-all",
    ]);
    let classifier = Classifier::new(table, static_resolver(), ClassifyOptions::default());

    let fuel = classifier.classify(&input("5541", "SHELL 123", 30.0), "");
    assert_eq!(fuel.rule_id.as_deref(), Some("rule-1"));
    assert_eq!(fuel.gl_account.as_deref(), Some("Gas and Tolls"));

    let other = classifier.classify(&input("5812", "DINER", 30.0), "");
    assert_eq!(other.rule_id.as_deref(), Some("rule-2"));
    assert_eq!(other.matched_by, MatchedBy::Other);
    assert_eq!(other.action, Action::Review);
}

// ---------------------------------------------------------------------------
// Test 3: Comment and blank rows drop out without reordering
// ---------------------------------------------------------------------------
#[test]
fn comment_and_blank_rows_keep_relative_order() {
    let table = table(&[
        ",# Fuel,,,,,,,,,",
        "5541,,,,,,,Gas and Tolls,,AUTO_POST,",
        ",,,,,,,,,,",
        ",*USPS*,,,,,,5210,,AUTO_POST,",
        ",*ORPHAN*,,,,,,,,AUTO_POST,no account",
        ",# Travel,,,,,,,,,",
        "4112,,,,,,,5216,,AUTO_POST,",
    ]);

    let summary: Vec<(&str, &str)> = table
        .rules
        .iter()
        .map(|r| (r.id.as_str(), r.outputs.gl_account.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("rule-1", "Gas and Tolls"),
            ("rule-2", "5210"),
            ("rule-3", "5216"),
        ]
    );
}

// ---------------------------------------------------------------------------
// Test 4: Budget and rule accounts compared in the same identifier space
// ---------------------------------------------------------------------------
#[test]
fn discrepancy_against_travel_budget() {
    let table = table(&[
        ",*AMTRAK*,,,,,,5216,Travel Expenses,AUTO_POST,",
        ",*USPS*,,,,,,5210,Postal Expenses,AUTO_POST,",
        "5541,,,,,,,Gas and Tolls,Gas and Tolls,AUTO_POST,",
    ]);
    let classifier = Classifier::new(table, static_resolver(), ClassifyOptions::default());

    let agrees = classifier.classify(&input("", "AMTRAK .COM", 89.0), "5216 - Travel Expenses");
    assert!(!agrees.has_discrepancy);
    assert_eq!(agrees.confidence, Confidence::High);

    let disagrees = classifier.classify(&input("", "USPS 0042", 9.0), "5216 - Travel Expenses");
    assert!(disagrees.has_discrepancy);
    assert_eq!(disagrees.confidence, Confidence::Medium);
    let info = disagrees.discrepancy.unwrap();
    assert_eq!(info.budget_account, "5216");
    assert_eq!(info.resolved_rule_account, "5210");

    // Name-keyed accounts resolve through the same map.
    let fuel = classifier.classify(&input("5541", "BP", 40.0), "Delivery Cost - Gas Tolls Fines");
    assert!(!fuel.has_discrepancy);

    // Unknown labels fall back to the numbered prefix, or stay unresolved.
    let fallback = classifier.classify(&input("", "USPS", 9.0), "5299 - Misc");
    assert!(fallback.has_discrepancy);
    let unresolved = classifier.classify(&input("", "USPS", 9.0), "Team Offsite");
    assert!(!unresolved.has_discrepancy);
}

// ---------------------------------------------------------------------------
// Test 5: Wildcard semantics through the whole table
// ---------------------------------------------------------------------------
#[test]
fn wildcard_patterns_match_case_insensitively() {
    let table = table(&[
        ",*ENTERPRISE*DRU*,,,,,,Vehicle Lease and Mileage,,AUTO_POST,",
        ",USPS*,,,,,,5210,,AUTO_POST,",
        ",*TAXI APP,,,,,,5216,,AUTO_POST,",
    ]);
    let classifier = Classifier::new(table, static_resolver(), ClassifyOptions::default());
    let account = |merchant: &str| {
        classifier
            .classify(&input("", merchant, 1.0), "")
            .gl_account
    };

    assert_eq!(
        account("Enterprise Rental DRU Corp").as_deref(),
        Some("Vehicle Lease and Mileage")
    );
    assert_eq!(
        account("DRU CORP ENTERPRISE").as_deref(),
        Some("Vehicle Lease and Mileage")
    );
    assert_eq!(account("usps12345").as_deref(), Some("5210"));
    assert_eq!(account("123USPS"), None);
    assert_eq!(account("curb taxi app").as_deref(), Some("5216"));
}

// ---------------------------------------------------------------------------
// Test 6: Amount ranges and text amounts
// ---------------------------------------------------------------------------
#[test]
fn amount_ranges_and_unusable_amounts() {
    let table = table(&[
        ",*STAPLES*,500,,,,,5239,Office Expenses,REVIEW,large order",
        ",*STAPLES*,,499.99,,,,5239,Office Expenses,AUTO_POST,supplies",
    ]);
    let classifier = Classifier::new(table, static_resolver(), ClassifyOptions::default());

    let large = classifier.classify(&input("", "STAPLES 77", 500.0), "");
    assert_eq!(large.action, Action::Review);
    let small = classifier.classify(&input("", "STAPLES 77", 499.99), "");
    assert_eq!(small.action, Action::AutoPost);

    let text_amount: InputContext = EvaluationRequest {
        merchant: "STAPLES 77".into(),
        amount: Amount::parse("pending"),
        ..Default::default()
    }
    .into();
    let skipped = classifier.classify(&text_amount, "");
    assert_eq!(skipped.rule_id, None);
    assert_eq!(skipped.action, Action::Review);
    let ids: Vec<&str> = skipped
        .skipped_rules
        .iter()
        .map(|s| s.rule_id.as_str())
        .collect();
    assert_eq!(ids, vec!["rule-1", "rule-2"]);
}

// ---------------------------------------------------------------------------
// Test 7: Team and email columns, exact and pattern
// ---------------------------------------------------------------------------
#[test]
fn team_and_email_conditions() {
    let table = table(&[
        "7211,,,,Delivery,,,Coin Wash Fees,,REVIEW,exact team",
        "7211,,,,,*@example.com,,Coin Wash Fees,,AUTO_POST,staff email",
        "7211,,,,,,,Outsourcing Washing,,REVIEW,anyone else",
    ]);
    let classifier = Classifier::new(table, static_resolver(), ClassifyOptions::default());
    let classify = |team: &str, email: &str| {
        let input: InputContext = EvaluationRequest {
            mcc: "7211".into(),
            user_team: team.into(),
            user_email: email.into(),
            ..Default::default()
        }
        .into();
        classifier.classify(&input, "").rule_id
    };

    assert_eq!(classify("Delivery", "").as_deref(), Some("rule-1"));
    // exact team match is case-sensitive
    assert_eq!(classify("delivery", "").as_deref(), Some("rule-3"));
    assert_eq!(classify("", "Ana@Example.com").as_deref(), Some("rule-2"));
    assert_eq!(classify("", "ana@example.org").as_deref(), Some("rule-3"));
}

// ---------------------------------------------------------------------------
// Test 8: CSV file → decision document file → same classifications
// ---------------------------------------------------------------------------
#[test]
fn compiled_document_classifies_like_source_sheet() {
    let mut csv = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(
        csv,
        "{HEADER}\n\
         5541,,,,,,,Gas and Tolls,Gas and Tolls,AUTO_POST,MCC fuel\n\
         ,*GOOGLE*CLOUD*,,,,,,5243,Web Services,AUTO_POST,\"Hosting, compute\"\n\
         ,AMAZON.COM*,,,Production,,,Chemicals and Detergent,,REVIEW,\n\
         ,*STAPLES*,10,250,,,,5239,Office Expenses,AUTO_POST,\n"
    )
    .unwrap();
    let from_csv = load_table(csv.path()).unwrap();

    let mut doc = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    doc.write_all(write_document(&from_csv).unwrap().as_bytes())
        .unwrap();
    let from_doc = load_table(doc.path()).unwrap();
    assert_eq!(from_doc, from_csv);

    let a = Classifier::new(from_csv, static_resolver(), ClassifyOptions::default());
    let b = Classifier::new(from_doc, static_resolver(), ClassifyOptions::default());
    for probe in [
        input("5541", "GULF OIL", 59.0),
        input("7399", "GOOGLE*CLOUD ZPC8VJ", 12.0),
        input("", "STAPLES 42", 100.0),
        input("", "STAPLES 42", 1000.0),
        input("5942", "AMAZON.COM*AB12", 20.0),
    ] {
        assert_eq!(a.classify(&probe, ""), b.classify(&probe, ""));
    }
}

// ---------------------------------------------------------------------------
// Test 9: Configuration errors are reported at load time
// ---------------------------------------------------------------------------
#[test]
fn invalid_rows_fail_to_load() {
    let mut bad_action = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(
        bad_action,
        "{HEADER}\n,*USPS*,,,,,,5210,,AUTOPOST,\n"
    )
    .unwrap();
    let err = load_table(bad_action.path()).unwrap_err();
    assert!(matches!(err, GlRulesError::RuleLoad { .. }));
    assert!(err.to_string().contains("AUTOPOST"));

    let bad_bound = format!("{HEADER}\n,*USPS*,ten,,,,,5210,,AUTO_POST,\n");
    let err = parse_table(bad_bound.as_bytes(), RuleFormat::Csv).unwrap_err();
    assert!(matches!(
        err,
        GlRulesError::InvalidBound { line: 2, .. }
    ));
}

// ---------------------------------------------------------------------------
// Test 10: Notes-based matched_by reporting
// ---------------------------------------------------------------------------
#[test]
fn notes_policy_reports_from_notes() {
    let table = table(&[
        "4112,,,,,,,5216,Travel Expenses,AUTO_POST,passenger rail",
        ",*USPS*,,,,,,5210,Postal Expenses,AUTO_POST,mcc not involved",
    ]);
    let options = ClassifyOptions {
        matched_by: MatchedByPolicy::Notes,
    };
    let classifier = Classifier::new(table, static_resolver(), options);

    // The notes do not mention MCC, so the merchant is credited.
    let rail = classifier.classify(&input("4112", "AMTRAK", 89.0), "5210 - Postal Expenses");
    assert_eq!(rail.matched_by, MatchedBy::Merchant);
    assert_eq!(rail.confidence, Confidence::Medium);

    // Notes mentioning "mcc" win regardless of the conditions.
    let mail = classifier.classify(&input("", "USPS", 5.0), "5216 - Travel Expenses");
    assert_eq!(mail.matched_by, MatchedBy::Mcc);
    assert_eq!(mail.confidence, Confidence::High);
}

// ---------------------------------------------------------------------------
// Test 11: Amounts too large for a decimal never satisfy amount bounds
// ---------------------------------------------------------------------------
#[test]
fn out_of_range_amount_skips_amount_rules() {
    let table = table(&[
        ",*STAPLES*,,100,,,,5239,Office Expenses,AUTO_POST,small order",
        ",*STAPLES*,,,,,,5239,Office Expenses,REVIEW,any other order",
    ]);
    let classifier = Classifier::new(table, static_resolver(), ClassifyOptions::default());

    let huge: InputContext =
        serde_json::from_str(r#"{"merchant":"STAPLES","amount":1e30}"#).unwrap();
    let result = classifier.classify(&huge, "");

    assert_eq!(result.rule_id.as_deref(), Some("rule-2"));
    assert_eq!(result.action, Action::Review);
    assert_eq!(result.skipped_rules.len(), 1);
    assert_eq!(result.skipped_rules[0].rule_id, "rule-1");
}
