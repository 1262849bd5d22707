use std::path::Path;

use anyhow::{Context, Result};
use jsonify::DocumentAction;

use crate::rows;

/// Convert exported rows into a JSON document, creating it or appending to it.
pub fn run(rows_path: &Path, output: &Path, append: bool) -> Result<()> {
    let input = std::fs::read_to_string(rows_path)
        .with_context(|| format!("failed to read rows from {}", rows_path.display()))?;
    let records = rows::parse_rows(&input)
        .with_context(|| format!("failed to parse rows in {}", rows_path.display()))?;

    let action = if append {
        DocumentAction::Append
    } else {
        DocumentAction::Create
    };

    let existing = match action {
        DocumentAction::Append => Some(
            std::fs::read(output)
                .with_context(|| format!("failed to read existing document {}", output.display()))?,
        ),
        DocumentAction::Create => None,
    };

    let bytes = jsonify::document::apply(action, existing.as_deref(), &records)
        .with_context(|| format!("failed to build document {}", output.display()))?;

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(output, bytes)
        .with_context(|| format!("failed to write document {}", output.display()))?;

    tracing::info!(records = records.len(), ?action, path = %output.display(), "document written");

    match action {
        DocumentAction::Create => println!(
            "Created {} with {} records.",
            output.display(),
            records.len()
        ),
        DocumentAction::Append => println!(
            "Appended {} records to {}.",
            records.len(),
            output.display()
        ),
    }

    Ok(())
}
