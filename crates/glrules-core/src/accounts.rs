//! Budget-label to GL-account resolution.
//!
//! Budgets in the spend-management system are named either after a numbered
//! GL account ("5216 - Travel Expenses") or after a COGS account that has no
//! number ("Gas and Tolls"). Both resolve to a canonical account identifier
//! that can be compared with a rule's account.

use crate::error::GlRulesError;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

const DEFAULT_BUDGET_MAP_JSON: &str = include_str!("../../../data/budget_accounts.json");

/// `NNNN - Name`, the numbered account convention.
static NUMBERED_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})\s*-").expect("numbered label regex is valid"));

/// Maps a budget label (or an account identifier) to a canonical account.
pub trait AccountResolver: Send + Sync {
    /// Look up `label` exactly. Returns `None` when the label is unknown.
    fn lookup(&self, label: &str) -> Option<String>;

    /// Resolve a budget label: exact lookup, then the `NNNN -` prefix.
    fn resolve(&self, label: &str) -> Option<String> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        self.lookup(label)
            .or_else(|| numbered_account(label).map(str::to_string))
    }
}

/// Extract the 4-digit account number from a `NNNN - Name` label.
pub fn numbered_account(label: &str) -> Option<&str> {
    NUMBERED_LABEL
        .captures(label)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Static label → account table, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetAccountMap {
    entries: BTreeMap<String, String>,
}

impl BudgetAccountMap {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// Parse a flat JSON object of label → account.
    pub fn from_json(json: &str) -> Result<Self, GlRulesError> {
        let entries: BTreeMap<String, String> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    /// Load a map from a JSON file.
    pub fn load(path: &Path) -> Result<Self, GlRulesError> {
        let load_err = |reason: String| GlRulesError::BudgetMapLoad {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let map = Self::from_json(&content).map_err(|e| load_err(e.to_string()))?;
        debug!(path = %path.display(), labels = map.len(), "loaded budget map");
        Ok(map)
    }

    /// The embedded map of the known budgets.
    pub fn embedded() -> Result<Self, GlRulesError> {
        Self::from_json(DEFAULT_BUDGET_MAP_JSON)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AccountResolver for BudgetAccountMap {
    fn lookup(&self, label: &str) -> Option<String> {
        self.entries.get(label).cloned()
    }
}
