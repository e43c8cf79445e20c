//! Transform a JSON Lines file

use anyhow::{Context, Result};
use rowmap_core::MappingConfig;

use crate::jsonl;

/// Run the mapping over `input`.
///
/// With a transformer name, writes one output record per line. Without one,
/// runs the mapping's combine section and writes a single JSON object keyed
/// by label.
pub async fn run(
    mapping_path: &str,
    transformer: Option<&str>,
    input: &str,
    output: Option<&str>,
) -> Result<()> {
    tracing::info!("Loading mapping from {}", mapping_path);
    let config = MappingConfig::load(mapping_path).context("Failed to load mapping")?;

    let records = jsonl::read_records(input).await?;
    tracing::info!("Read {} records from {}", records.len(), input);

    let contents = match transformer {
        Some(name) => {
            let mut transformer = config
                .transformer(name)
                .with_context(|| format!("Failed to build transformer '{}'", name))?;
            let rows = transformer
                .transform(&records)
                .with_context(|| format!("Transformer '{}' failed", name))?;

            let mut contents = String::new();
            for row in &rows {
                contents.push_str(&serde_json::to_string(row)?);
                contents.push('\n');
            }
            contents
        }
        None => {
            let mut combined = config
                .combination()
                .context("No transformer given and the mapping has no usable combine section")?;
            let data = combined
                .transform(&records)
                .context("Combined transform failed")?;
            format!("{}\n", serde_json::to_string_pretty(&data)?)
        }
    };

    jsonl::write_output(output, &contents).await?;
    tracing::info!("✓ Transformed {} records", records.len());
    Ok(())
}
