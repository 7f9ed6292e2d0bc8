use glrules_core::classify::outcome::BatchItem;
use glrules_core::error::GlRulesError;
use std::path::PathBuf;
use tracing::info;

use crate::output;
use crate::SourceArgs;

pub fn run(input_file: PathBuf, source: &SourceArgs, output_format: &str) -> Result<(), GlRulesError> {
    let classifier = super::load_classifier(source)?;

    let bytes = std::fs::read(&input_file)?;
    let items: Vec<BatchItem> = serde_json::from_slice(&bytes)?;
    info!(items = items.len(), table = %classifier.table().name, "classifying batch");

    let results = classifier.classify_batch(&items);

    match output_format {
        "json" => output::json::print(&results)?,
        _ => output::table::print_batch(&results),
    }

    Ok(())
}
