//! Validate mapping command

use anyhow::{Context, Result};
use rowmap_core::{MappingConfig, Transformer};

/// Run the validate command
pub async fn run(mapping_path: &str) -> Result<()> {
    tracing::info!("Validating mapping: {}", mapping_path);

    let config = MappingConfig::load(mapping_path).context("Failed to load mapping")?;
    let definitions = config
        .definitions()
        .context("Failed to resolve transformers")?;

    for (name, def) in &definitions {
        let transformer = Transformer::new(def)
            .with_context(|| format!("Transformer '{}' is invalid", name))?;
        tracing::info!(
            "✓ {}: {}",
            name,
            transformer.output_names().join(", ")
        );
    }

    if !config.combine.is_empty() {
        let combined = config
            .combination()
            .context("Failed to build combine section")?;
        tracing::info!("✓ combine: {}", combined.labels().join(", "));
    }

    tracing::info!("✓ Mapping is valid");
    Ok(())
}
