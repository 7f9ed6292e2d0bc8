use glrules_core::error::GlRulesError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), GlRulesError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
