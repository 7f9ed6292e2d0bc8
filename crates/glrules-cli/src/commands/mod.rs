pub mod batch;
pub mod classify;
pub mod compile;
pub mod rules;

use glrules_core::accounts::{AccountResolver, BudgetAccountMap};
use glrules_core::error::GlRulesError;
use glrules_core::rules::builtin;
use glrules_core::rules::table::DecisionTable;
use glrules_core::{Classifier, ClassifyOptions};
use std::path::Path;
use tracing::info;

use crate::SourceArgs;

/// Load a rule table from `path`, or the embedded sample rules.
pub fn load_table(path: Option<&Path>) -> Result<DecisionTable, GlRulesError> {
    match path {
        Some(path) => glrules_core::rules::load_table(path),
        None => builtin::default_table(),
    }
}

/// Build a classifier from the rule and budget-map sources on the command line.
pub fn load_classifier(source: &SourceArgs) -> Result<Classifier, GlRulesError> {
    let table = load_table(source.rules.as_deref())?;

    let resolver: Box<dyn AccountResolver> = match source.budget_map.as_deref() {
        Some(path) => Box::new(BudgetAccountMap::load(path)?),
        None => Box::new(BudgetAccountMap::embedded()?),
    };

    info!(rules = table.len(), "rule table ready");

    let options = ClassifyOptions {
        matched_by: source.matched_by.into(),
    };
    Ok(Classifier::new(table, resolver, options))
}
