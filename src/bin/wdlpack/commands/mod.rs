//! Command implementations

pub mod bundle;
pub mod completions;
pub mod extract;
pub mod inspect;
pub mod zip;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use wdlpack::core::Document;
use wdlpack::util::diagnostic::suggestions;

/// Read a JSON file that must hold an object.
pub fn read_json_object(path: &Path) -> Result<Map<String, Value>> {
    let text = wdlpack::util::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse JSON in {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!(
            "{} does not contain a JSON object\n{}",
            path.display(),
            suggestions::BAD_INPUT_JSON
        ),
    }
}

/// Load the top-level workflow document and its imports.
pub fn load_main(path: &Path) -> Result<Arc<Document>> {
    if !path.is_file() {
        anyhow::bail!(
            "cannot read workflow {}\n{}",
            path.display(),
            suggestions::MAIN_NOT_FOUND
        );
    }
    wdlpack::core::load(path)
}
