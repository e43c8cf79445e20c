//! List the output keys of a transformer

use anyhow::{Context, Result};
use rowmap_core::MappingConfig;

/// Print one emitted key per line
pub async fn run(mapping_path: &str, transformer: &str) -> Result<()> {
    let config = MappingConfig::load(mapping_path).context("Failed to load mapping")?;
    let transformer = config
        .transformer(transformer)
        .with_context(|| format!("Failed to build transformer '{}'", transformer))?;

    for name in transformer.output_names() {
        println!("{}", name);
    }
    Ok(())
}
