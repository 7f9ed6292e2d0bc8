use glrules_core::error::GlRulesError;
use glrules_core::rules::{self, RuleFormat};
use std::path::PathBuf;
use tracing::info;

pub fn run(input_file: PathBuf, out: Option<PathBuf>) -> Result<(), GlRulesError> {
    if RuleFormat::from_path(&input_file) == Some(RuleFormat::Document) {
        return Err(GlRulesError::RuleInvalid(format!(
            "{} is already a decision document",
            input_file.display()
        )));
    }

    let table = rules::load_table(&input_file)?;
    let json = rules::write_document(&table)?;

    match out {
        Some(path) => {
            std::fs::write(&path, format!("{json}\n"))?;
            info!(rules = table.len(), path = %path.display(), "wrote decision document");
        }
        None => println!("{json}"),
    }

    Ok(())
}
