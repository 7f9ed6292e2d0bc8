pub mod builtin;
pub mod document;
pub mod expr;
pub mod pattern;
pub mod schema;
pub mod source;
pub mod table;

use crate::error::GlRulesError;
use document::DecisionDocument;
use std::collections::HashSet;
use std::path::Path;
use table::DecisionTable;
use tracing::debug;

/// On-disk formats a rule table can be loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFormat {
    /// Authoring sheet exported as CSV.
    Csv,
    /// Authoring sheet as an XLSX workbook.
    Xlsx,
    /// Compiled decision document (JSON).
    Document,
}

impl RuleFormat {
    /// Pick a format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<RuleFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(RuleFormat::Csv),
            "xlsx" => Some(RuleFormat::Xlsx),
            "json" => Some(RuleFormat::Document),
            _ => None,
        }
    }
}

/// Load a rule table from a file, dispatching on its extension.
pub fn load_table(path: &Path) -> Result<DecisionTable, GlRulesError> {
    let load_err = |reason: String| GlRulesError::RuleLoad {
        path: path.to_path_buf(),
        reason,
    };

    let format = RuleFormat::from_path(path).ok_or_else(|| {
        load_err("unsupported file extension (expected .csv, .xlsx or .json)".into())
    })?;
    let bytes = std::fs::read(path).map_err(|e| load_err(e.to_string()))?;

    let table = parse_table(&bytes, format).map_err(|e| load_err(e.to_string()))?;
    debug!(path = %path.display(), rules = table.len(), "loaded rule table");
    Ok(table)
}

/// Parse and validate a rule table from in-memory bytes.
pub fn parse_table(bytes: &[u8], format: RuleFormat) -> Result<DecisionTable, GlRulesError> {
    let table = match format {
        RuleFormat::Csv => table::build_table(&source::read_csv(bytes)?)?,
        RuleFormat::Xlsx => table::build_table(&source::read_xlsx(bytes)?)?,
        RuleFormat::Document => {
            let doc: DecisionDocument = serde_json::from_slice(bytes)?;
            document::from_document(&doc)?
        }
    };
    validate_table(&table)?;
    Ok(table)
}

/// Check that a table has rules and that rule ids are unique.
pub fn validate_table(table: &DecisionTable) -> Result<(), GlRulesError> {
    if table.is_empty() {
        return Err(GlRulesError::RuleInvalid("rules must not be empty".into()));
    }

    let mut seen = HashSet::with_capacity(table.len());
    for rule in &table.rules {
        if rule.id.is_empty() {
            return Err(GlRulesError::RuleInvalid("rule id must not be empty".into()));
        }
        if !seen.insert(rule.id.as_str()) {
            return Err(GlRulesError::RuleInvalid(format!(
                "duplicate rule id '{}'",
                rule.id
            )));
        }
    }

    Ok(())
}

/// Render a table as a pretty-printed decision document.
pub fn write_document(table: &DecisionTable) -> Result<String, GlRulesError> {
    Ok(serde_json::to_string_pretty(&document::to_document(table))?)
}
