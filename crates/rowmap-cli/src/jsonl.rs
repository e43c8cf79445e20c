//! JSON Lines input and output

use anyhow::{Context, Result};
use rowmap_core::Record;
use serde_json::Value;

/// Parse JSON Lines text into records, skipping blank lines
pub fn parse_records(contents: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(trimmed)
            .with_context(|| format!("line {}: invalid JSON", index + 1))?;
        match value {
            Value::Object(record) => records.push(record),
            _ => anyhow::bail!("line {}: input is not a JSON object", index + 1),
        }
    }
    Ok(records)
}

/// Read records from a JSON Lines file
pub async fn read_records(path: &str) -> Result<Vec<Record>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read input file {}", path))?;
    parse_records(&contents)
}

/// Write text to `path`, or to stdout when no path is given
pub async fn write_output(path: Option<&str>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = std::path::Path::new(path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, contents)
                .await
                .with_context(|| format!("Failed to write output file {}", path))?;
        }
        None => print!("{}", contents),
    }
    Ok(())
}
